use std::error::Error as StdError;
use std::fmt;

/// A `Result` alias where the `Err` case is `xhr_hook::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// A boxed error, as produced by responders and body streams.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// The Errors that may occur while registering hooks, patching a surface,
/// or emulating a response.
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    name: Option<String>,
    source: Option<BoxError>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                name: None,
                source: source.map(Into::into),
            }),
        }
    }

    pub(crate) fn with_name(mut self, name: impl Into<String>) -> Error {
        self.inner.name = Some(name.into());
        self
    }

    /// Returns the hook or property name related to this error, if any.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns true if a hook with the same name was already registered.
    pub fn is_duplicate_hook(&self) -> bool {
        matches!(self.inner.kind, Kind::DuplicateHook)
    }

    /// Returns true if a getter was expected on the surface but not found.
    pub fn is_not_a_getter(&self) -> bool {
        matches!(self.inner.kind, Kind::NotAGetter)
    }

    /// Returns true if a method was expected on the surface but not found.
    pub fn is_not_a_method(&self) -> bool {
        matches!(self.inner.kind, Kind::NotAMethod)
    }

    /// Returns true if the error came from a hook's responder.
    pub fn is_responder(&self) -> bool {
        matches!(self.inner.kind, Kind::Responder)
    }

    /// Returns true if the request was canceled by `abort` or a reopen.
    pub fn is_canceled(&self) -> bool {
        matches!(self.inner.kind, Kind::Canceled)
    }

    /// Returns true if the error is related to the response body.
    pub fn is_body(&self) -> bool {
        matches!(self.inner.kind, Kind::Body)
    }

    /// Returns true if the error is related to building a response.
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = f.debug_struct("xhr_hook::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref name) = self.inner.name {
            builder.field("name", name);
        }
        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner.kind {
            Kind::DuplicateHook => f.write_str("hook already registered")?,
            Kind::NotAGetter => f.write_str("property is not a getter")?,
            Kind::NotAMethod => f.write_str("property is not a method")?,
            Kind::Responder => f.write_str("hook responder failed")?,
            Kind::Canceled => f.write_str("request canceled")?,
            Kind::Body => f.write_str("error reading response body")?,
            Kind::Builder => f.write_str("builder error")?,
        }

        if let Some(name) = &self.inner.name {
            write!(f, " ({name})")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    DuplicateHook,
    NotAGetter,
    NotAMethod,
    Responder,
    Canceled,
    Body,
    Builder,
}

// constructors

pub(crate) fn duplicate_hook(name: &str) -> Error {
    Error::new(Kind::DuplicateHook, None::<Error>).with_name(name)
}

pub(crate) fn not_a_getter(property: &str) -> Error {
    Error::new(Kind::NotAGetter, None::<Error>).with_name(property)
}

pub(crate) fn not_a_method(property: &str) -> Error {
    Error::new(Kind::NotAMethod, None::<Error>).with_name(property)
}

pub(crate) fn responder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Responder, Some(e))
}

pub(crate) fn canceled() -> Error {
    Error::new(Kind::Canceled, None::<Error>)
}

pub(crate) fn body<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Body, Some(e))
}

#[cfg(feature = "json")]
pub(crate) fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder, Some(e))
}

#[derive(Debug)]
pub(crate) struct NoRuntime;

impl fmt::Display for NoRuntime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("no async runtime available to drive the hooked request")
    }
}

impl StdError for NoRuntime {}
