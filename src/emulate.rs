//! Replaying a hook's response through the request object's readiness
//! lifecycle.
//!
//! The emulated sequence for one request is:
//!
//! - `readyState = 1`, `readystatechange`
//! - responder resolves: status fields set, `loadstart`, `readyState = 2`
//! - per body chunk: `readyState = 3`, `readystatechange`, `progress`
//! - body ends: `readyState = 4`, `load`, `readystatechange`, `loadend`
//!
//! A failed responder or body read (cancellation included) jumps to
//! `readyState = 4` and emits `error` then `readystatechange`; there is no
//! `load` or `loadend` on that path.

use futures_util::future::{self, Either};
use futures_util::pin_mut;
use tokio_util::sync::CancellationToken;

use crate::hooks::Responder;
use crate::native::{Event, NativeRequest};
use crate::state::{ResponseBuffer, State, DEFAULT_BUFFER_CAPACITY};
use crate::xhr::XmlHttpRequest;

/// Upper bound on the buffer reserved up front from a declared
/// `content-length`; larger bodies grow into place as they stream.
const MAX_INITIAL_CAPACITY: usize = 16 * DEFAULT_BUFFER_CAPACITY;

/// Identifies the lifecycle an emulation belongs to.
///
/// Every state mutation goes through `update`, which refuses to touch the
/// instance once a later `open` has started a new lifecycle.
pub(crate) struct Lifecycle {
    generation: u64,
    token: CancellationToken,
    default_capacity: usize,
}

impl Lifecycle {
    pub(crate) fn new(generation: u64, token: CancellationToken, default_capacity: usize) -> Self {
        Lifecycle {
            generation,
            token,
            default_capacity,
        }
    }

    fn update<R, T>(&self, xhr: &XmlHttpRequest<R>, f: impl FnOnce(&mut State) -> T) -> Option<T>
    where
        R: NativeRequest,
    {
        let out = xhr.with_state(|state| {
            if state.generation == self.generation {
                Some(f(state))
            } else {
                None
            }
        });
        if out.is_none() {
            debug!("discarding stale lifecycle {}", self.generation);
        }
        out
    }
}

/// Starts emulating `responder` onto `xhr`.
///
/// The opening transition happens before this returns; the rest runs on
/// the current tokio runtime. A lifecycle is emulated at most once: a
/// second start before the next `open` is dropped.
pub(crate) fn start<R: NativeRequest>(xhr: XmlHttpRequest<R>, responder: Responder, lc: Lifecycle) {
    let claimed = lc.update(&xhr, |s| {
        if s.ready_state.is_some() {
            return false;
        }
        s.ready_state = Some(1);
        true
    });
    match claimed {
        Some(true) => {}
        Some(false) => {
            warn!("request already sent, ignoring");
            return;
        }
        None => return,
    }
    xhr.dispatch(Event::ReadyStateChange);

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(run(xhr, responder, lc));
        }
        Err(e) => {
            error!("cannot drive hooked request: {}", e);
            fail(
                &xhr,
                &lc,
                crate::error::responder(crate::error::NoRuntime),
            );
        }
    }
}

async fn run<R: NativeRequest>(xhr: XmlHttpRequest<R>, responder: Responder, lc: Lifecycle) {
    let res = match responder.respond(lc.token.clone()).await {
        Ok(res) if !lc.token.is_cancelled() => res,
        Ok(_) => return fail(&xhr, &lc, crate::error::canceled()),
        Err(e) if lc.token.is_cancelled() => {
            debug!("responder stopped after cancel: {}", e);
            return fail(&xhr, &lc, crate::error::canceled());
        }
        Err(e) => return fail(&xhr, &lc, crate::error::responder(e)),
    };

    let (head, mut body) = res.into_parts();
    let capacity = initial_capacity(head.content_length(), lc.default_capacity);
    let url = head.url.to_string();

    let headers = lc.update(&xhr, |s| {
        s.status = Some(head.status.as_u16());
        s.status_text = Some(head.status_text.clone());
        s.response = Some(head);
    });
    if headers.is_none() {
        return;
    }
    xhr.dispatch(Event::LoadStart);

    let buffer = ResponseBuffer::with_capacity(capacity);
    if lc
        .update(&xhr, move |s| {
            s.buffer = buffer;
            s.ready_state = Some(2);
        })
        .is_none()
    {
        return;
    }

    loop {
        let chunk = {
            let read = body.chunk();
            let cancelled = lc.token.cancelled();
            pin_mut!(read, cancelled);
            match future::select(read, cancelled).await {
                Either::Left((chunk, _)) if !lc.token.is_cancelled() => chunk,
                _ => return fail(&xhr, &lc, crate::error::canceled()),
            }
        };

        match chunk {
            Ok(Some(chunk)) if chunk.is_empty() => continue,
            Ok(Some(chunk)) => {
                let loaded = lc.update(&xhr, |s| {
                    s.buffer.push(&chunk);
                    s.ready_state = Some(3);
                    s.buffer.len()
                });
                let loaded = match loaded {
                    Some(n) => n as u64,
                    None => return,
                };
                xhr.dispatch(Event::ReadyStateChange);
                xhr.dispatch(Event::Progress { loaded });
            }
            Ok(None) => break,
            Err(e) => return fail(&xhr, &lc, e),
        }
    }

    let done = lc.update(&xhr, |s| {
        s.buffer.finish();
        s.ready_state = Some(4);
        s.response_url = Some(url);
        s.buffer.len()
    });
    if let Some(len) = done {
        debug!("hooked request complete, {} bytes", len);
        xhr.dispatch(Event::Load);
        xhr.dispatch(Event::ReadyStateChange);
        xhr.dispatch(Event::LoadEnd);
    }
}

fn initial_capacity(declared: Option<u64>, default: usize) -> usize {
    match declared {
        Some(len) => usize::try_from(len).map_or(MAX_INITIAL_CAPACITY, |len| {
            len.min(MAX_INITIAL_CAPACITY)
        }),
        None => default,
    }
}

fn fail<R: NativeRequest>(xhr: &XmlHttpRequest<R>, lc: &Lifecycle, err: crate::Error) {
    if lc.update(xhr, |s| s.ready_state = Some(4)).is_none() {
        return;
    }
    warn!("hooked request failed: {:?}", err);
    xhr.dispatch(Event::Error);
    xhr.dispatch(Event::ReadyStateChange);
}
