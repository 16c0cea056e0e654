//! Hooks that answer intercepted requests, and the registry that orders them.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};

use futures_util::future::{BoxFuture, FutureExt, TryFutureExt};
use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::{Request, Response};

/// A handler offered every intercepted request.
///
/// Returning `None` lets the request through to the network untouched.
/// Returning a `Responder` claims the request: no later hook is asked and
/// the responder's result is emulated onto the request object.
///
/// Any `Fn(&Request) -> Option<Responder>` closure is a `Hook`.
pub trait Hook: Send + Sync + 'static {
    /// Decide whether to answer `req`.
    fn handle(&self, req: &Request) -> Option<Responder>;
}

impl<F> Hook for F
where
    F: Fn(&Request) -> Option<Responder> + Send + Sync + 'static,
{
    fn handle(&self, req: &Request) -> Option<Responder> {
        self(req)
    }
}

/// The asynchronous answer of a hook that claimed a request.
///
/// Called once with the request's cancellation token, which fires when
/// the request is aborted or reopened. A responder is expected to fail
/// promptly once it does.
pub struct Responder {
    respond: Box<
        dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<Response, BoxError>> + Send,
    >,
}

impl Responder {
    /// Creates a responder from an async function of the cancellation token.
    pub fn new<F, Fut, E>(f: F) -> Responder
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Response, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Responder {
            respond: Box::new(move |token| f(token).map_err(Into::<BoxError>::into).boxed()),
        }
    }

    /// Creates a responder that answers immediately with `res`.
    pub fn from_response(res: Response) -> Responder {
        Responder::new(move |_| async move { Ok::<_, BoxError>(res) })
    }

    pub(crate) fn respond(
        self,
        token: CancellationToken,
    ) -> BoxFuture<'static, Result<Response, BoxError>> {
        (self.respond)(token)
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Responder").finish()
    }
}

/// What `insert` does when a hook with the same name already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnExists {
    /// Overwrite the existing hook, keeping its position.
    Replace,
    /// Keep the existing hook and do nothing.
    #[default]
    Ignore,
    /// Fail with a duplicate hook error.
    Error,
}

type PendingInstall = Box<dyn FnOnce(&Arc<HookRegistry>) -> crate::Result<()> + Send>;

/// An ordered set of named hooks.
///
/// Hooks are tried in insertion order. Names are unique.
///
/// Most applications use the process-wide [`HookRegistry::global`] through
/// [`insert_hook`] and [`remove_hook`]; separate registries are useful to
/// isolate tests.
pub struct HookRegistry {
    hooks: RwLock<Vec<(String, Arc<dyn Hook>)>>,
    pending: Mutex<Vec<PendingInstall>>,
}

static GLOBAL: Lazy<Arc<HookRegistry>> = Lazy::new(HookRegistry::new);

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Arc<HookRegistry> {
        Arc::new(HookRegistry {
            hooks: RwLock::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        })
    }

    /// The process-wide registry.
    pub fn global() -> &'static Arc<HookRegistry> {
        &GLOBAL
    }

    /// Registers a hook under `name`.
    ///
    /// The first registration installs the interception layer on every
    /// surface attached with [`Installer::attach`](crate::Installer::attach).
    ///
    /// # Errors
    ///
    /// Fails without changing the registry if `name` exists and
    /// `on_exists` is `OnExists::Error`, or if installing an attached
    /// surface fails.
    pub fn insert<H: Hook>(
        self: &Arc<Self>,
        name: &str,
        hook: H,
        on_exists: OnExists,
    ) -> crate::Result<()> {
        self.install_pending()?;

        let mut hooks = self.hooks.write().unwrap();
        match hooks.iter_mut().find(|(n, _)| n == name) {
            None => {
                hooks.push((name.to_owned(), Arc::new(hook)));
                debug!("inserted hook {:?}", name);
            }
            Some(entry) => match on_exists {
                OnExists::Replace => {
                    entry.1 = Arc::new(hook);
                    debug!("replaced hook {:?}", name);
                }
                OnExists::Ignore => {
                    debug!("hook {:?} already exists, ignoring", name);
                }
                OnExists::Error => return Err(crate::error::duplicate_hook(name)),
            },
        }
        Ok(())
    }

    /// Removes the hook named `name`. Returns false if there was none.
    pub fn remove(&self, name: &str) -> bool {
        let mut hooks = self.hooks.write().unwrap();
        match hooks.iter().position(|(n, _)| n == name) {
            Some(idx) => {
                hooks.remove(idx);
                debug!("removed hook {:?}", name);
                true
            }
            None => {
                warn!("no hook named {:?} to remove", name);
                false
            }
        }
    }

    /// Removes every hook.
    pub fn clear(&self) {
        self.hooks.write().unwrap().clear();
    }

    /// Returns true if a hook named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.hooks.read().unwrap().iter().any(|(n, _)| n == name)
    }

    /// The registered hook names, in trial order.
    pub fn names(&self) -> Vec<String> {
        self.hooks
            .read()
            .unwrap()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// The number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.read().unwrap().len()
    }

    /// Returns true if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offers `req` to each hook in order and returns the first answer,
    /// along with the name of the hook that gave it.
    pub fn dispatch(&self, req: &Request) -> Option<(String, Responder)> {
        let hooks = self.hooks.read().unwrap().clone();
        for (name, hook) in hooks {
            trace!("offering {} {} to hook {:?}", req.method(), req.url(), name);
            if let Some(responder) = hook.handle(req) {
                return Some((name, responder));
            }
        }
        None
    }

    /// Queues `install` until the first hook is registered, or runs it now
    /// if there already is one.
    pub(crate) fn on_first_hook(self: &Arc<Self>, install: PendingInstall) -> crate::Result<()> {
        if self.is_empty() {
            self.pending.lock().unwrap().push(install);
            Ok(())
        } else {
            install(self)
        }
    }

    /// Runs every queued install, even after one fails, and returns the
    /// first failure.
    fn install_pending(self: &Arc<Self>) -> crate::Result<()> {
        let pending = std::mem::take(&mut *self.pending.lock().unwrap());
        let mut first_err = None;
        for install in pending {
            if let Err(e) = install(self) {
                warn!("installing attached surface failed: {}", e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.names())
            .finish()
    }
}

/// Registers a hook on the global registry.
///
/// See [`HookRegistry::insert`].
pub fn insert_hook<H: Hook>(name: &str, hook: H, on_exists: OnExists) -> crate::Result<()> {
    HookRegistry::global().insert(name, hook, on_exists)
}

/// Removes a hook from the global registry.
///
/// See [`HookRegistry::remove`].
pub fn remove_hook(name: &str) -> bool {
    HookRegistry::global().remove(name)
}

/// Removes every hook from the global registry.
pub fn clear_hooks() {
    HookRegistry::global().clear()
}

/// Routes this crate's log output (and everything else logged through the
/// `log` facade) to `logger`.
///
/// The `log` facade accepts one logger per process, so this can be called
/// successfully only once and the sink cannot be swapped afterwards. To
/// redirect output at runtime, install a logger that forwards to a
/// replaceable target.
///
/// # Errors
///
/// Fails if a logger has already been installed for the process, by this
/// function or by any other `log` backend.
pub fn set_logger(logger: Box<dyn log::Log>) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(logger)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}
