//! Installing the interception layer on a request surface.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::emulate::{self, Lifecycle};
use crate::hooks::HookRegistry;
use crate::materialize::{decode_text, materialize};
use crate::native::NativeRequest;
use crate::request::Request;
use crate::state::DEFAULT_BUFFER_CAPACITY;
use crate::surface::{Method, Surface};
use crate::value::Value;
use crate::xhr::{property, XmlHttpRequest};

/// The marker set on a surface once it has been patched.
pub const INSTALLED_MARKER: &str = "xhr-hook.installed";

const FALLBACK_BASE: &str = "http://localhost/";

/// The outcome of installing on a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Installed {
    /// The surface was patched by this call.
    Patched,
    /// The surface had already been patched; nothing changed.
    AlreadyInstalled,
}

/// Installs the interception layer on request surfaces.
///
/// ```
/// # use xhr_hook::Installer;
/// let installer = Installer::new()
///     .base_url(url::Url::parse("https://app.example.com/").unwrap())
///     .default_buffer_capacity(64 * 1024);
/// # drop(installer);
/// ```
#[derive(Clone)]
pub struct Installer {
    config: Config,
}

#[derive(Clone)]
struct Config {
    registry: Option<Arc<HookRegistry>>,
    base_url: Option<Url>,
    default_buffer_capacity: usize,
}

impl Installer {
    /// An installer using the global registry, no base URL, and a 1 MiB
    /// default buffer capacity.
    pub fn new() -> Installer {
        Installer {
            config: Config {
                registry: None,
                base_url: None,
                default_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            },
        }
    }

    /// Dispatch to `registry` instead of the global one.
    pub fn registry(mut self, registry: Arc<HookRegistry>) -> Installer {
        self.config.registry = Some(registry);
        self
    }

    /// Resolve relative request URLs against `url` when the native object
    /// does not report a document URL.
    pub fn base_url(mut self, url: Url) -> Installer {
        self.config.base_url = Some(url);
        self
    }

    /// The body buffer size used when a response declares no length.
    pub fn default_buffer_capacity(mut self, capacity: usize) -> Installer {
        self.config.default_buffer_capacity = capacity;
        self
    }

    /// Patches `surface`, once.
    ///
    /// A second call for the same surface logs a warning and returns
    /// `Installed::AlreadyInstalled` without touching it.
    ///
    /// # Errors
    ///
    /// Fails if the surface lacks one of the expected getters or methods.
    pub fn install<R: NativeRequest>(
        &self,
        surface: &Surface<XmlHttpRequest<R>>,
    ) -> crate::Result<Installed> {
        if !surface.set_marker(INSTALLED_MARKER) {
            warn!("request surface already hooked, skipping");
            return Ok(Installed::AlreadyInstalled);
        }

        let registry = self
            .config
            .registry
            .clone()
            .unwrap_or_else(|| HookRegistry::global().clone());
        let config = Arc::new(self.config.clone());

        patch_getters(surface)?;

        surface.patch_method(property::OPEN, |this: &XmlHttpRequest<R>, original, args| {
            let method = arg_string(&args, 0);
            let url = arg_string(&args, 1);
            this.with_state(|s| {
                s.reopen();
                s.method = method;
                s.url = url;
            });
            original(this, args)
        })?;

        surface.patch_method(
            property::SET_REQUEST_HEADER,
            |this: &XmlHttpRequest<R>, original, args| {
                let header = (arg_string(&args, 0), arg_string(&args, 1));
                this.with_state(|s| s.headers.push(header));
                original(this, args)
            },
        )?;

        surface.patch_method(
            property::SEND,
            move |this: &XmlHttpRequest<R>, original: &Method<XmlHttpRequest<R>>, args| {
                send(this, original, args, &registry, &config)
            },
        )?;

        surface.patch_method(property::ABORT, |this: &XmlHttpRequest<R>, original, args| {
            this.with_state(|s| s.cancel.cancel());
            original(this, args)
        })?;

        surface.patch_method(
            property::GET_ALL_RESPONSE_HEADERS,
            |this: &XmlHttpRequest<R>, original, args| {
                let emulated = this.with_state(|s| s.response.as_ref().map(|h| h.header_lines()));
                match emulated {
                    Some(lines) => lines.into(),
                    None => original(this, args),
                }
            },
        )?;

        debug!("request surface hooked");
        Ok(Installed::Patched)
    }

    /// Installs on `surface` when the first hook is registered in this
    /// installer's registry, or right away if it already has hooks.
    ///
    /// # Errors
    ///
    /// Fails if installing right away fails.
    pub fn attach<R: NativeRequest>(
        self,
        surface: Arc<Surface<XmlHttpRequest<R>>>,
    ) -> crate::Result<()> {
        let registry = self
            .config
            .registry
            .clone()
            .unwrap_or_else(|| HookRegistry::global().clone());

        registry.on_first_hook(Box::new(move |registry: &Arc<HookRegistry>| {
            self.registry(registry.clone())
                .install(&surface)
                .map(drop)
        }))
    }
}

impl Default for Installer {
    fn default() -> Installer {
        Installer::new()
    }
}

impl fmt::Debug for Installer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Installer")
            .field("base_url", &self.config.base_url.as_ref().map(Url::as_str))
            .field(
                "default_buffer_capacity",
                &self.config.default_buffer_capacity,
            )
            .finish()
    }
}

/// Patches `surface` with the default `Installer`.
///
/// See [`Installer::install`].
pub fn ensure_installed<R: NativeRequest>(
    surface: &Surface<XmlHttpRequest<R>>,
) -> crate::Result<Installed> {
    Installer::new().install(surface)
}

fn patch_getters<R: NativeRequest>(surface: &Surface<XmlHttpRequest<R>>) -> crate::Result<()> {
    surface.patch_getter(property::READY_STATE, |this: &XmlHttpRequest<R>, original| {
        match this.with_state(|s| s.ready_state) {
            Some(n) => n.into(),
            None => original(),
        }
    })?;

    surface.patch_getter(property::STATUS, |this: &XmlHttpRequest<R>, original| {
        match this.with_state(|s| s.status) {
            Some(n) => n.into(),
            None => original(),
        }
    })?;

    surface.patch_getter(property::STATUS_TEXT, |this: &XmlHttpRequest<R>, original| {
        match this.with_state(|s| s.status_text.clone()) {
            Some(text) => text.into(),
            None => original(),
        }
    })?;

    surface.patch_getter(property::RESPONSE, |this: &XmlHttpRequest<R>, original| {
        let kind = this.response_type();
        let emulated = this.with_state(|s| {
            s.response
                .as_ref()
                .map(|head| (s.buffer.bytes(), head.content_type().to_owned()))
        });
        match emulated {
            Some((bytes, content_type)) => materialize(&kind, bytes, &content_type),
            None => original(),
        }
    })?;

    surface.patch_getter(property::RESPONSE_URL, |this: &XmlHttpRequest<R>, original| {
        match this.with_state(|s| s.response_url.clone()) {
            Some(url) => url.into(),
            None => original(),
        }
    })?;

    surface.patch_getter(property::RESPONSE_TEXT, |this: &XmlHttpRequest<R>, original| {
        let emulated = this.with_state(|s| {
            if s.is_emulating() {
                Some(decode_text(s.buffer.as_slice()).into_owned())
            } else {
                None
            }
        });
        match emulated {
            Some(text) => text.into(),
            None => original(),
        }
    })?;

    Ok(())
}

fn send<R: NativeRequest>(
    this: &XmlHttpRequest<R>,
    original: &Method<XmlHttpRequest<R>>,
    args: Vec<Value>,
    registry: &HookRegistry,
    config: &Config,
) -> Value {
    let base = this
        .native()
        .base_url()
        .or_else(|| config.base_url.clone())
        .unwrap_or_else(fallback_base);

    let captured = this.with_state(|s| {
        if s.ready_state.is_some() {
            None
        } else {
            Some((Request::from_state(s, &base), s.generation, s.cancel.clone()))
        }
    });
    let (req, generation, token) = match captured {
        Some(captured) => captured,
        None => {
            warn!("hooked request already sent, ignoring");
            return Value::Undefined;
        }
    };

    match registry.dispatch(&req) {
        Some((name, responder)) => {
            debug!("hook {:?} answered {} {}", name, req.method(), req.url());
            let lc = Lifecycle::new(generation, token, config.default_buffer_capacity);
            emulate::start(this.clone(), responder, lc);
            Value::Undefined
        }
        None => {
            trace!("no hook answered {} {}, sending natively", req.method(), req.url());
            original(this, args)
        }
    }
}

fn fallback_base() -> Url {
    Url::parse(FALLBACK_BASE).expect("fallback base is a valid url")
}

fn arg_string(args: &[Value], idx: usize) -> String {
    args.get(idx)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_owned()
}
