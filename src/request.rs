use std::fmt;

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use url::Url;

use crate::state::State;

/// An intercepted request, as offered to hooks.
///
/// Carries no body: hooks decide from the method, URL and headers.
#[derive(Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
}

impl Request {
    /// Constructs a new request.
    #[inline]
    pub fn new(method: Method, url: Url) -> Self {
        Request {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Get the method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the url.
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a mutable reference to the headers.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Translates captured instance state into a request.
    ///
    /// Relative URLs are resolved against `base`. Headers are appended in
    /// capture order, so repeated names become multiple values.
    pub(crate) fn from_state(state: &State, base: &Url) -> Request {
        let method = Method::from_bytes(state.method.as_bytes()).unwrap_or_else(|_| {
            warn!("invalid request method {:?}, using GET", state.method);
            Method::GET
        });

        let url = base.join(&state.url).unwrap_or_else(|e| {
            warn!("unable to resolve url {:?}: {}", state.url, e);
            base.clone()
        });

        let mut req = Request::new(method, url);
        for (name, value) in &state.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    req.headers.append(name, value);
                }
                _ => warn!("skipping invalid request header {:?}", name),
            }
        }
        req
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .finish()
    }
}
