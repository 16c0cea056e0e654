use bytes::{Bytes, BytesMut};
use tokio_util::sync::CancellationToken;

use crate::response::Head;

/// Initial body buffer size when the response declares no content-length.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Interception state attached to one request instance.
///
/// Created on first access and dropped with the instance. The emulated
/// fields stay `None` until a hook answers the request; once set they
/// shadow the native values for the rest of the lifecycle.
#[derive(Debug)]
pub(crate) struct State {
    pub(crate) cancel: CancellationToken,
    /// Bumped by every `open`; lets a stale lifecycle notice it was replaced.
    pub(crate) generation: u64,
    pub(crate) method: String,
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) ready_state: Option<u16>,
    pub(crate) status: Option<u16>,
    pub(crate) status_text: Option<String>,
    pub(crate) response: Option<Head>,
    pub(crate) buffer: ResponseBuffer,
    pub(crate) response_url: Option<String>,
}

impl State {
    pub(crate) fn new() -> State {
        State {
            cancel: CancellationToken::new(),
            generation: 0,
            method: String::new(),
            url: String::new(),
            headers: Vec::new(),
            ready_state: None,
            status: None,
            status_text: None,
            response: None,
            buffer: ResponseBuffer::default(),
            response_url: None,
        }
    }

    /// Starts a new lifecycle: the previous token is canceled and every
    /// captured and emulated field is cleared.
    pub(crate) fn reopen(&mut self) {
        self.cancel.cancel();
        let generation = self.generation.wrapping_add(1);
        *self = State::new();
        self.generation = generation;
    }

    pub(crate) fn is_emulating(&self) -> bool {
        self.response.is_some()
    }
}

/// The growable buffer a streamed body accumulates into.
///
/// Bytes are appended to `filling` while the body streams; `finish` trims
/// them into `complete`, which is then shared without copying.
#[derive(Debug, Default)]
pub(crate) struct ResponseBuffer {
    filling: BytesMut,
    complete: Option<Bytes>,
}

impl ResponseBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> ResponseBuffer {
        ResponseBuffer {
            filling: BytesMut::with_capacity(capacity),
            complete: None,
        }
    }

    /// Appends `chunk`, reserving at least double the needed size when it
    /// does not fit.
    pub(crate) fn push(&mut self, chunk: &[u8]) {
        let needed = self.filling.len() + chunk.len();
        if needed > self.filling.capacity() {
            let additional = needed.saturating_mul(2) - self.filling.len();
            self.filling.reserve(additional);
        }
        self.filling.extend_from_slice(chunk);
    }

    /// The valid prefix.
    pub(crate) fn as_slice(&self) -> &[u8] {
        match self.complete {
            Some(ref bytes) => bytes,
            None => &self.filling,
        }
    }

    /// The received bytes. Free once the body is complete.
    pub(crate) fn bytes(&self) -> Bytes {
        match self.complete {
            Some(ref bytes) => bytes.clone(),
            None => Bytes::copy_from_slice(&self.filling),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Trims the buffer to exactly the data received.
    pub(crate) fn finish(&mut self) {
        let filled = self.filling.split();
        let exact = if filled.capacity() > filled.len() {
            Bytes::copy_from_slice(&filled)
        } else {
            filled.freeze()
        };
        self.filling = BytesMut::new();
        self.complete = Some(exact);
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        match self.complete {
            Some(ref bytes) => bytes.len(),
            None => self.filling.capacity(),
        }
    }
}
