//! The host's legacy request object.

use url::Url;

use crate::value::Value;

/// The native request object being intercepted.
///
/// This is whatever the host provides: a browser binding, an embedded
/// script engine's object, or a test double. Methods take `&self` because
/// host objects manage their own interior state and are shared between the
/// caller and the emulation task.
pub trait NativeRequest: Send + Sync + 'static {
    /// Initializes a request.
    fn open(&self, method: &str, url: &str);

    /// Adds a request header.
    fn set_request_header(&self, name: &str, value: &str);

    /// Sends the request over the real network stack.
    fn send(&self, body: Value);

    /// Aborts an in-flight native request.
    fn abort(&self);

    /// All response headers as CRLF-separated `name: value` lines.
    fn get_all_response_headers(&self) -> String;

    /// The native readiness value, `0` through `4`.
    fn ready_state(&self) -> u16;

    /// The native status code, `0` before headers arrive.
    fn status(&self) -> u16;

    /// The native status text.
    fn status_text(&self) -> String;

    /// The native `response` value.
    fn response(&self) -> Value;

    /// The native final URL.
    fn response_url(&self) -> String;

    /// The native `responseText`.
    fn response_text(&self) -> String;

    /// The declared `responseType`, `""` when unset.
    fn response_type(&self) -> String;

    /// The document URL relative request URLs resolve against.
    fn base_url(&self) -> Option<Url> {
        None
    }

    /// Dispatches an event to the object's listeners.
    fn dispatch_event(&self, event: Event);
}

/// Events a request object dispatches during a lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// `readystatechange`
    ReadyStateChange,
    /// `loadstart`
    LoadStart,
    /// `progress`, with the cumulative number of body bytes received.
    Progress {
        /// Bytes received so far.
        loaded: u64,
    },
    /// `load`
    Load,
    /// `error`
    Error,
    /// `loadend`
    LoadEnd,
}

impl Event {
    /// The DOM event name.
    pub fn name(&self) -> &'static str {
        match self {
            Event::ReadyStateChange => "readystatechange",
            Event::LoadStart => "loadstart",
            Event::Progress { .. } => "progress",
            Event::Load => "load",
            Event::Error => "error",
            Event::LoadEnd => "loadend",
        }
    }
}
