use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use http::{HeaderMap, HeaderValue, StatusCode};
use url::Url;

use crate::error::BoxError;

/// A response produced by a hook's responder.
///
/// This is the canonical, hook-facing representation. It is emulated onto
/// the legacy request object by feeding its body through the readiness
/// state machine.
pub struct Response {
    head: Head,
    body: Body,
}

/// Everything about a `Response` except its body.
#[derive(Clone, Debug)]
pub(crate) struct Head {
    pub(crate) status: StatusCode,
    pub(crate) status_text: String,
    pub(crate) headers: HeaderMap,
    pub(crate) url: Url,
}

impl Response {
    /// Constructs a `200 OK` response with the given body.
    pub fn new<B: Into<Body>>(body: B) -> Response {
        Response {
            head: Head {
                status: StatusCode::OK,
                status_text: String::from("OK"),
                headers: HeaderMap::new(),
                url: blank_url(),
            },
            body: body.into(),
        }
    }

    /// Constructs a response whose body is `value` serialized as JSON, with
    /// a `content-type: application/json` header.
    #[cfg(feature = "json")]
    #[cfg_attr(docsrs, doc(cfg(feature = "json")))]
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> crate::Result<Response> {
        let body = serde_json::to_vec(value).map_err(crate::error::builder)?;
        Ok(Response::new(body).header(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
    }

    /// Sets the status code. The status text follows the code's canonical
    /// reason phrase unless set afterwards with `status_text`.
    pub fn status(mut self, status: StatusCode) -> Response {
        self.head.status = status;
        self.head.status_text = status.canonical_reason().unwrap_or("").to_owned();
        self
    }

    /// Sets the status text.
    pub fn status_text(mut self, text: impl Into<String>) -> Response {
        self.head.status_text = text.into();
        self
    }

    /// Appends a header. Multiple values for one name are kept.
    pub fn header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Response {
        self.head.headers.append(name, value);
        self
    }

    /// Replaces all headers.
    pub fn headers(mut self, headers: HeaderMap) -> Response {
        self.head.headers = headers;
        self
    }

    /// Sets the final, resolved URL.
    pub fn url(mut self, url: Url) -> Response {
        self.head.url = url;
        self
    }

    /// Get the `StatusCode` of this `Response`.
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.head.status
    }

    /// Get the `Headers` of this `Response`.
    #[inline]
    pub fn header_map(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Get the final `Url` of this `Response`.
    #[inline]
    pub fn final_url(&self) -> &Url {
        &self.head.url
    }

    /// Get the content-length of this response, if declared.
    pub fn content_length(&self) -> Option<u64> {
        self.head.content_length()
    }

    pub(crate) fn into_parts(self) -> (Head, Body) {
        (self.head, self.body)
    }
}

impl Head {
    pub(crate) fn content_length(&self) -> Option<u64> {
        self.headers
            .get(http::header::CONTENT_LENGTH)?
            .to_str()
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    pub(crate) fn content_type(&self) -> &str {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Formats the headers as `name: value` lines joined by CRLF.
    pub(crate) fn header_lines(&self) -> String {
        self.headers
            .iter()
            .map(|(name, value)| {
                format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()))
            })
            .collect::<Vec<_>>()
            .join("\r\n")
    }
}

/// A `Response` can be built from an `http::Response`. The final URL is
/// taken from a `Url` stored in the response extensions, if any.
impl<T: Into<Body>> From<http::Response<T>> for Response {
    fn from(r: http::Response<T>) -> Response {
        let (mut parts, body) = r.into_parts();
        let url = parts.extensions.remove::<Url>().unwrap_or_else(blank_url);
        Response {
            head: Head {
                status: parts.status,
                status_text: parts.status.canonical_reason().unwrap_or("").to_owned(),
                headers: parts.headers,
                url,
            },
            body: body.into(),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Response")
            .field("url", &self.head.url.as_str())
            .field("status", &self.head.status)
            .field("headers", &self.head.headers)
            .finish()
    }
}

fn blank_url() -> Url {
    Url::parse("about:blank").expect("about:blank is a valid url")
}

/// The lazily readable body of a `Response`.
pub struct Body {
    inner: Inner,
}

enum Inner {
    Reusable(Bytes),
    Streaming(Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>),
}

impl Body {
    /// An empty body.
    pub fn empty() -> Body {
        Body::reusable(Bytes::new())
    }

    /// Wrap a stream of chunks into a body. Chunks are pulled one at a
    /// time as the response is emulated.
    pub fn wrap_stream<S, O, E>(stream: S) -> Body
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<BoxError> + 'static,
    {
        let stream = stream.map(|item| item.map(Into::into).map_err(Into::into));
        Body {
            inner: Inner::Streaming(Box::pin(stream)),
        }
    }

    fn reusable(chunk: Bytes) -> Body {
        Body {
            inner: Inner::Reusable(chunk),
        }
    }

    /// Pull the next chunk of the body.
    ///
    /// Returns `Ok(None)` once the body is exhausted.
    pub async fn chunk(&mut self) -> crate::Result<Option<Bytes>> {
        match self.inner {
            Inner::Reusable(ref mut bytes) => {
                if bytes.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(std::mem::take(bytes)))
                }
            }
            Inner::Streaming(ref mut stream) => match stream.next().await {
                Some(Ok(chunk)) => Ok(Some(chunk)),
                Some(Err(e)) => Err(crate::error::body(e)),
                None => Ok(None),
            },
        }
    }
}

impl Default for Body {
    #[inline]
    fn default() -> Body {
        Body::empty()
    }
}

impl From<Bytes> for Body {
    #[inline]
    fn from(bytes: Bytes) -> Body {
        Body::reusable(bytes)
    }
}

impl From<Vec<u8>> for Body {
    #[inline]
    fn from(vec: Vec<u8>) -> Body {
        Body::reusable(vec.into())
    }
}

impl From<&'static [u8]> for Body {
    #[inline]
    fn from(s: &'static [u8]) -> Body {
        Body::reusable(Bytes::from_static(s))
    }
}

impl From<String> for Body {
    #[inline]
    fn from(s: String) -> Body {
        Body::reusable(s.into())
    }
}

impl From<&'static str> for Body {
    #[inline]
    fn from(s: &'static str) -> Body {
        s.as_bytes().into()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Body").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_sets_reason_phrase() {
        let res = Response::new("").status(StatusCode::CREATED);
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.head.status_text, "Created");

        let res = Response::new("")
            .status(StatusCode::CREATED)
            .status_text("Made It");
        assert_eq!(res.head.status_text, "Made It");
    }

    #[test]
    fn content_length_parses_declared_header() {
        let res = Response::new("").header(
            http::header::CONTENT_LENGTH,
            HeaderValue::from_static("42"),
        );
        assert_eq!(res.content_length(), Some(42));

        let res = Response::new("").header(
            http::header::CONTENT_LENGTH,
            HeaderValue::from_static("nope"),
        );
        assert_eq!(res.content_length(), None);
    }

    #[test]
    fn header_lines_join_with_crlf() {
        let res = Response::new("")
            .header(
                http::header::HeaderName::from_static("x-test"),
                HeaderValue::from_static("true"),
            )
            .header(
                http::header::HeaderName::from_static("x-test"),
                HeaderValue::from_static("again"),
            )
            .header(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain"),
            );
        let (head, _) = res.into_parts();
        assert_eq!(
            head.header_lines(),
            "x-test: true\r\nx-test: again\r\ncontent-type: text/plain"
        );
    }

    #[test]
    fn from_http_response() {
        let url = Url::parse("https://example.com/final").unwrap();
        let mut http = http::Response::builder()
            .status(404)
            .header("x-from", "http")
            .body("missing")
            .unwrap();
        http.extensions_mut().insert(url.clone());

        let res = Response::from(http);
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.head.status_text, "Not Found");
        assert_eq!(res.header_map()["x-from"], "http");
        assert_eq!(res.final_url(), &url);
    }

    #[tokio::test]
    async fn reusable_body_yields_once() {
        let mut body = Body::from("hello");
        assert_eq!(body.chunk().await.unwrap(), Some(Bytes::from_static(b"hello")));
        assert_eq!(body.chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_body_yields_nothing() {
        let mut body = Body::empty();
        assert_eq!(body.chunk().await.unwrap(), None);
    }

    #[tokio::test]
    async fn streaming_body_surfaces_errors() {
        let chunks: Vec<Result<&'static str, BoxError>> =
            vec![Ok("a"), Err("broken pipe".into())];
        let mut body = Body::wrap_stream(futures_util::stream::iter(chunks));
        assert_eq!(body.chunk().await.unwrap(), Some(Bytes::from_static(b"a")));
        assert!(body.chunk().await.unwrap_err().is_body());
    }
}
