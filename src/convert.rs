use std::error::Error;
use std::io;

use crate::kind::Kind;
use crate::list::ErrorList;
use crate::structured::StructuredError;

pub const NIL_MAP_MESSAGE: &str = "can not map nil to structured error";

// ── Wrapping ──────────────────────────────────────────────────────

/// Converts any error into a [`StructuredError`].
///
/// Structured errors pass through untouched and an [`ErrorList`] folds into
/// its chain. Anything else becomes a service error carrying its `Display`
/// text, with its `source()` chain wrapped the same way.
#[track_caller]
pub fn wrap<E>(err: E) -> StructuredError
where
    E: Error + Send + Sync + 'static,
{
    wrap_boxed(Box::new(err))
}

#[track_caller]
pub fn wrap_boxed(err: Box<dyn Error + Send + Sync + 'static>) -> StructuredError {
    match StructuredError::from_boxed(err) {
        Some(err) => err,
        None => StructuredError::service_error(NIL_MAP_MESSAGE),
    }
}

/// Borrowing form of [`wrap`]; structured errors and lists are cloned.
#[track_caller]
pub fn map(err: &(dyn Error + 'static)) -> StructuredError {
    if let Some(structured) = err.downcast_ref::<StructuredError>() {
        return structured.clone();
    }
    if let Some(list) = err.downcast_ref::<ErrorList>() {
        return match list.to_error() {
            Some(err) => err,
            None => StructuredError::service_error(NIL_MAP_MESSAGE),
        };
    }
    StructuredError::from_plain(err)
}

/// [`map`], with `None` mapped to a service error saying so.
#[track_caller]
pub fn map_opt(err: Option<&(dyn Error + 'static)>) -> StructuredError {
    match err {
        Some(err) => map(err),
        None => StructuredError::service_error(NIL_MAP_MESSAGE),
    }
}

pub fn as_structured<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a StructuredError> {
    err.downcast_ref::<StructuredError>()
}

/// Whether `target` is found in `err` or its causes. `false` when either
/// side is `None`.
///
/// Plain errors are searched through their `source()` chain by `Display`
/// text without being converted.
pub fn contains(
    err: Option<&(dyn Error + 'static)>,
    target: Option<&(dyn Error + 'static)>,
) -> bool {
    let (Some(err), Some(target)) = (err, target) else {
        return false;
    };
    let target_message = match as_structured(target) {
        Some(structured) => structured.message().to_string(),
        None => target.to_string(),
    };
    let mut level = Some(err);
    while let Some(current) = level {
        if let Some(structured) = as_structured(current) {
            return structured.contains(target);
        }
        if current.to_string() == target_message {
            return true;
        }
        level = current.source();
    }
    false
}

// ── From impls ────────────────────────────────────────────────────

fn io_error_kind(kind: io::ErrorKind) -> Kind {
    match kind {
        io::ErrorKind::NotFound => Kind::NotFound,
        io::ErrorKind::PermissionDenied => Kind::Forbidden,
        io::ErrorKind::TimedOut => Kind::Timeout,
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => Kind::BadRequest,
        io::ErrorKind::Unsupported => Kind::NotImplemented,
        io::ErrorKind::WouldBlock => Kind::TooEarly,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::BrokenPipe => Kind::Unavailable,
        _ => Kind::ServiceError,
    }
}

/// Classifies by `io::ErrorKind` and records the kind and any OS error code
/// as metadata.
impl From<io::Error> for StructuredError {
    #[track_caller]
    fn from(err: io::Error) -> Self {
        let kind = err.kind();
        let mut structured = StructuredError::from_kind(io_error_kind(kind), err.to_string())
            .with_meta("io_kind", kind.to_string());
        if let Some(code) = err.raw_os_error() {
            structured = structured.with_meta("os_error", code.to_string());
        }
        structured
    }
}

impl From<serde_json::Error> for StructuredError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        let kind = if err.is_io() {
            Kind::ServiceError
        } else {
            Kind::BadRequest
        };
        let structured = StructuredError::from_kind(kind, err.to_string());
        if err.line() == 0 {
            return structured;
        }
        structured
            .with_meta("line", err.line().to_string())
            .with_meta("column", err.column().to_string())
    }
}

// ── ResultExt ─────────────────────────────────────────────────────

/// Converts the error side of any `Result` into a [`StructuredError`],
/// recording the caller's location.
///
/// ```ignore
/// let bytes = std::fs::read(path).or_structured(Kind::NotFound, "reading config")?;
/// let port: u16 = raw.parse().wrap_err()?;
/// ```
pub trait ResultExt<T> {
    /// A new error of `kind` with `message`, the original error as its cause.
    fn or_structured(self, kind: Kind, message: &str) -> Result<T, StructuredError>;

    /// The original error converted by [`wrap`].
    fn wrap_err(self) -> Result<T, StructuredError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    #[track_caller]
    fn or_structured(self, kind: Kind, message: &str) -> Result<T, StructuredError> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(StructuredError::from_kind(kind, message).with_cause(err)),
        }
    }

    #[track_caller]
    fn wrap_err(self) -> Result<T, StructuredError> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(wrap(err)),
        }
    }
}
