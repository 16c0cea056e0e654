#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # xhr-hook
//!
//! The `xhr-hook` crate intercepts calls made through a legacy,
//! `XMLHttpRequest`-style request object and lets registered hooks answer
//! them with a synthetic response, or let them through to the real network
//! untouched.
//!
//! Callers keep using the old object API: `open`, `setRequestHeader`,
//! `send`, `abort`, and the readiness and response getters. Hooks see a
//! modern [`Request`] and return a [`Responder`] that produces a
//! [`Response`] asynchronously. The response is then replayed through the
//! old object's readiness lifecycle, firing `readystatechange`, `progress`,
//! `load` and friends as the body streams in.
//!
//! - Ordered, named hooks with a configurable duplicate policy
//! - Once-only patching of a shared request surface
//! - Text, array buffer, blob, JSON and XML document response types
//! - Cancellation on `abort` and reopen
//!
//! ## Answering a request
//!
//! ```no_run
//! # fn run<R: xhr_hook::NativeRequest>(native: R) -> xhr_hook::Result<()> {
//! use std::sync::Arc;
//! use xhr_hook::{OnExists, Request, Responder, Response, XmlHttpRequest};
//!
//! let surface = Arc::new(XmlHttpRequest::<R>::prototype());
//! xhr_hook::Installer::new().attach(surface.clone())?;
//!
//! xhr_hook::insert_hook(
//!     "mock-users",
//!     |req: &Request| {
//!         if req.url().path() == "/api/users" {
//!             Some(Responder::from_response(Response::new("[]")))
//!         } else {
//!             None
//!         }
//!     },
//!     OnExists::Replace,
//! )?;
//!
//! let xhr = XmlHttpRequest::new(native, surface);
//! xhr.open("GET", "/api/users")?;
//! xhr.send(xhr_hook::Value::Null)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! This crate logs through the [`log`] facade. Route it anywhere with
//! [`set_logger`], or with any `log` backend.

#[macro_use]
extern crate log;

pub use http::{header, HeaderMap, Method, StatusCode};
pub use tokio_util::sync::CancellationToken;
pub use url::Url;

#[cfg(feature = "document")]
pub use self::document::{Document, Element, Node};
pub use self::error::{BoxError, Error, Result};
pub use self::hooks::{
    clear_hooks, insert_hook, remove_hook, set_logger, Hook, HookRegistry, OnExists, Responder,
};
pub use self::install::{ensure_installed, Installed, Installer, INSTALLED_MARKER};
pub use self::materialize::{materialize, ResponseType};
pub use self::native::{Event, NativeRequest};
pub use self::request::Request;
pub use self::response::{Body, Response};
pub use self::state::DEFAULT_BUFFER_CAPACITY;
pub use self::surface::{Getter, Method as SurfaceMethod, Property, Surface};
pub use self::value::{Blob, Value};
pub use self::xhr::{property, XmlHttpRequest};

#[cfg(feature = "document")]
mod document;
mod emulate;
mod error;
mod hooks;
mod install;
mod materialize;
mod native;
mod request;
mod response;
mod state;
mod surface;
mod value;
mod xhr;
