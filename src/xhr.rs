//! Request instances and their native surface.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::materialize::ResponseType;
use crate::native::{Event, NativeRequest};
use crate::state::State;
use crate::surface::Surface;
use crate::value::Value;

/// Property names on a request surface.
pub mod property {
    /// `readyState` getter.
    pub const READY_STATE: &str = "readyState";
    /// `status` getter.
    pub const STATUS: &str = "status";
    /// `statusText` getter.
    pub const STATUS_TEXT: &str = "statusText";
    /// `response` getter.
    pub const RESPONSE: &str = "response";
    /// `responseURL` getter.
    pub const RESPONSE_URL: &str = "responseURL";
    /// `responseText` getter.
    pub const RESPONSE_TEXT: &str = "responseText";
    /// `open(method, url)` method.
    pub const OPEN: &str = "open";
    /// `setRequestHeader(name, value)` method.
    pub const SET_REQUEST_HEADER: &str = "setRequestHeader";
    /// `send(body)` method.
    pub const SEND: &str = "send";
    /// `abort()` method.
    pub const ABORT: &str = "abort";
    /// `getAllResponseHeaders()` method.
    pub const GET_ALL_RESPONSE_HEADERS: &str = "getAllResponseHeaders";
}

/// A legacy request object.
///
/// Wraps the host's native object together with the surface it dispatches
/// through and its interception state. Cloning gives another handle to
/// the same instance.
pub struct XmlHttpRequest<R> {
    inner: Arc<Inner<R>>,
}

struct Inner<R> {
    native: R,
    surface: Arc<Surface<XmlHttpRequest<R>>>,
    state: Mutex<Option<State>>,
}

impl<R: NativeRequest> XmlHttpRequest<R> {
    /// Creates an instance dispatching through `surface`.
    pub fn new(native: R, surface: Arc<Surface<XmlHttpRequest<R>>>) -> XmlHttpRequest<R> {
        XmlHttpRequest {
            inner: Arc::new(Inner {
                native,
                surface,
                state: Mutex::new(None),
            }),
        }
    }

    /// Builds the unpatched surface, whose properties all delegate to the
    /// native object.
    pub fn prototype() -> Surface<XmlHttpRequest<R>> {
        use self::property::*;

        let surface = Surface::new();

        surface.define_getter(READY_STATE, |this: &Self| this.native().ready_state().into());
        surface.define_getter(STATUS, |this: &Self| this.native().status().into());
        surface.define_getter(STATUS_TEXT, |this: &Self| this.native().status_text().into());
        surface.define_getter(RESPONSE, |this: &Self| this.native().response());
        surface.define_getter(RESPONSE_URL, |this: &Self| this.native().response_url().into());
        surface.define_getter(RESPONSE_TEXT, |this: &Self| {
            this.native().response_text().into()
        });

        surface.define_method(OPEN, |this: &Self, args: Vec<Value>| {
            this.native().open(arg_str(&args, 0), arg_str(&args, 1));
            Value::Undefined
        });
        surface.define_method(SET_REQUEST_HEADER, |this: &Self, args: Vec<Value>| {
            this.native()
                .set_request_header(arg_str(&args, 0), arg_str(&args, 1));
            Value::Undefined
        });
        surface.define_method(SEND, |this: &Self, args: Vec<Value>| {
            let body = args.into_iter().next().unwrap_or(Value::Null);
            this.native().send(body);
            Value::Undefined
        });
        surface.define_method(ABORT, |this: &Self, _args: Vec<Value>| {
            this.native().abort();
            Value::Undefined
        });
        surface.define_method(GET_ALL_RESPONSE_HEADERS, |this: &Self, _args: Vec<Value>| {
            this.native().get_all_response_headers().into()
        });

        surface
    }

    /// The wrapped native object.
    pub fn native(&self) -> &R {
        &self.inner.native
    }

    /// The surface this instance dispatches through.
    pub fn surface(&self) -> &Arc<Surface<XmlHttpRequest<R>>> {
        &self.inner.surface
    }

    /// Initializes the request.
    pub fn open(&self, method: &str, url: &str) -> crate::Result<()> {
        self.call(property::OPEN, vec![method.into(), url.into()])
            .map(drop)
    }

    /// Adds a request header.
    pub fn set_request_header(&self, name: &str, value: &str) -> crate::Result<()> {
        self.call(property::SET_REQUEST_HEADER, vec![name.into(), value.into()])
            .map(drop)
    }

    /// Sends the request. `Value::Null` sends no body.
    pub fn send(&self, body: impl Into<Value>) -> crate::Result<()> {
        self.call(property::SEND, vec![body.into()]).map(drop)
    }

    /// Aborts the request.
    pub fn abort(&self) -> crate::Result<()> {
        self.call(property::ABORT, Vec::new()).map(drop)
    }

    /// All response headers as CRLF-separated `name: value` lines.
    pub fn get_all_response_headers(&self) -> crate::Result<String> {
        self.call(property::GET_ALL_RESPONSE_HEADERS, Vec::new())
            .map(into_string)
    }

    /// The readiness value, `0` through `4`.
    pub fn ready_state(&self) -> crate::Result<u16> {
        self.get(property::READY_STATE)
            .map(|v| v.as_u16().unwrap_or(0))
    }

    /// The response status code.
    pub fn status(&self) -> crate::Result<u16> {
        self.get(property::STATUS).map(|v| v.as_u16().unwrap_or(0))
    }

    /// The response status text.
    pub fn status_text(&self) -> crate::Result<String> {
        self.get(property::STATUS_TEXT).map(into_string)
    }

    /// The response body, typed according to `responseType`.
    pub fn response(&self) -> crate::Result<Value> {
        self.get(property::RESPONSE)
    }

    /// The final URL of the response.
    pub fn response_url(&self) -> crate::Result<String> {
        self.get(property::RESPONSE_URL).map(into_string)
    }

    /// The response body as text.
    pub fn response_text(&self) -> crate::Result<String> {
        self.get(property::RESPONSE_TEXT).map(into_string)
    }

    /// The declared `responseType`, read from the native object.
    pub fn response_type(&self) -> ResponseType {
        ResponseType::parse(&self.native().response_type())
    }

    fn get(&self, name: &str) -> crate::Result<Value> {
        self.inner.surface.get(self, name)
    }

    fn call(&self, name: &str, args: Vec<Value>) -> crate::Result<Value> {
        self.inner.surface.call(self, name, args)
    }

    /// Runs `f` on the interception state, creating it on first access.
    ///
    /// The lock is held only for the duration of `f`; never dispatch events
    /// or call through the surface from inside it.
    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.inner.state.lock().unwrap();
        f(state.get_or_insert_with(State::new))
    }

    pub(crate) fn dispatch(&self, event: Event) {
        trace!("dispatch {}", event.name());
        self.native().dispatch_event(event);
    }
}

impl<R> Clone for XmlHttpRequest<R> {
    fn clone(&self) -> Self {
        XmlHttpRequest {
            inner: self.inner.clone(),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for XmlHttpRequest<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("XmlHttpRequest")
            .field("native", &self.inner.native)
            .finish()
    }
}

fn arg_str(args: &[Value], idx: usize) -> &str {
    args.get(idx).and_then(Value::as_str).unwrap_or("")
}

fn into_string(v: Value) -> String {
    match v {
        Value::String(s) => s,
        _ => String::new(),
    }
}
