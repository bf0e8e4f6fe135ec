use std::error::Error;

use crate::config;
use crate::kind::Kind;
use crate::list::ErrorList;
use crate::meta::Meta;
use crate::stacktrace::Stacktrace;

pub const NIL_MESSAGE: &str = "NIL";

/// A classified error value with metadata, call site and an owned cause
/// chain.
///
/// Builders consume and return the value; nothing is shared between two
/// errors, so attaching the same error in two places clones it.
///
/// The chain is `Option<Box<_>>` linked, and every chain-wide operation
/// (clone, equality, drop, rendering, encoding) walks it in a loop, so chain
/// depth is bounded by memory only.
#[derive(Default)]
pub struct StructuredError {
    pub(crate) id: String,
    pub(crate) code: i32,
    pub(crate) name: String,
    pub(crate) message: String,
    pub(crate) meta: Meta,
    pub(crate) stacktrace: Stacktrace,
    pub(crate) cause: Option<Box<StructuredError>>,
}

// ── Constructors ──────────────────────────────────────────────────

impl StructuredError {
    #[track_caller]
    pub fn new(code: i32, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new_at(code, name, message, Stacktrace::capture())
    }

    /// Constructs with an explicitly captured call site.
    pub fn new_at(
        code: i32,
        name: impl Into<String>,
        message: impl Into<String>,
        stacktrace: Stacktrace,
    ) -> Self {
        Self {
            id: config::get().new_id(),
            code,
            name: name.into(),
            message: message.into(),
            meta: Meta::new(),
            stacktrace,
            cause: None,
        }
    }

    #[track_caller]
    pub fn from_kind(kind: Kind, message: impl Into<String>) -> Self {
        Self::new(kind.code(), kind.name(), message)
    }

    pub fn from_kind_at(kind: Kind, message: impl Into<String>, stacktrace: Stacktrace) -> Self {
        Self::new_at(kind.code(), kind.name(), message, stacktrace)
    }

    #[track_caller]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::BadRequest, message)
    }

    #[track_caller]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::Unauthorized, message)
    }

    #[track_caller]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::Forbidden, message)
    }

    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::NotFound, message)
    }

    #[track_caller]
    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::NotAcceptable, message)
    }

    #[track_caller]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::Timeout, message)
    }

    #[track_caller]
    pub fn too_early(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::TooEarly, message)
    }

    #[track_caller]
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::TooManyRequests, message)
    }

    #[track_caller]
    pub fn service_error(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::ServiceError, message)
    }

    #[track_caller]
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::NotImplemented, message)
    }

    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::Unavailable, message)
    }

    #[track_caller]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::from_kind(Kind::Warning, message)
    }

    /// Stand-in for a missing value: not found, message `"NIL"`.
    #[track_caller]
    pub fn nil_error() -> Self {
        Self::from_kind(Kind::NotFound, NIL_MESSAGE)
    }

    /// Converts a type-erased error into a chain. Structured errors pass
    /// through, aggregates fold, anything else is wrapped as a service error
    /// together with its `source()` chain. An empty aggregate yields `None`.
    #[track_caller]
    pub(crate) fn from_boxed(err: Box<dyn Error + Send + Sync + 'static>) -> Option<Self> {
        let err = match err.downcast::<StructuredError>() {
            Ok(structured) => return Some(*structured),
            Err(err) => err,
        };
        let err = match err.downcast::<ErrorList>() {
            Ok(list) => return (*list).into_error(),
            Err(err) => err,
        };
        Some(Self::from_plain(err.as_ref()))
    }

    /// Wraps a plain error and each of its sources as service errors, all
    /// sharing the caller's location. A structured error found among the
    /// sources is cloned in as the remainder of the chain.
    #[track_caller]
    pub(crate) fn from_plain(err: &(dyn Error + 'static)) -> Self {
        let at = Stacktrace::capture();
        tracing::trace!(error = %err, "wrapping plain error");

        let mut levels = vec![Self::from_kind_at(
            Kind::ServiceError,
            err.to_string(),
            at.clone(),
        )];
        let mut tail = None;
        let mut source = err.source();
        while let Some(inner) = source {
            if let Some(structured) = inner.downcast_ref::<StructuredError>() {
                tail = Some(structured.clone());
                break;
            }
            levels.push(Self::from_kind_at(
                Kind::ServiceError,
                inner.to_string(),
                at.clone(),
            ));
            source = inner.source();
        }

        let mut chain = tail.map(Box::new);
        while let Some(mut level) = levels.pop() {
            level.cause = chain;
            chain = Some(Box::new(level));
        }
        match chain {
            Some(head) => *head,
            None => Self::from_kind_at(Kind::ServiceError, err.to_string(), at),
        }
    }
}

// ── Accessors ─────────────────────────────────────────────────────

impl StructuredError {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn stacktrace(&self) -> &Stacktrace {
        &self.stacktrace
    }

    /// The canonical kind, when `(code, name)` is one of the fixed pairs.
    pub fn kind(&self) -> Option<Kind> {
        Kind::from_parts(self.code, &self.name)
    }

    pub fn is_kind(&self, kind: Kind) -> bool {
        self.kind() == Some(kind)
    }

    /// The direct cause.
    pub fn cause(&self) -> Option<&StructuredError> {
        self.cause.as_deref()
    }

    /// This error followed by every cause, nearest first.
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// Every cause, nearest first, excluding this error.
    pub fn causes(&self) -> Chain<'_> {
        Chain {
            next: self.cause.as_deref(),
        }
    }

    pub fn root_cause(&self) -> &StructuredError {
        self.chain().last().unwrap_or(self)
    }

    /// Number of errors in the chain, this one included.
    pub fn depth(&self) -> usize {
        self.chain().count()
    }
}

/// Iterator over a cause chain.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<&'a StructuredError>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a StructuredError;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.cause.as_deref();
        Some(current)
    }
}

impl std::iter::FusedIterator for Chain<'_> {}

// ── Builders ──────────────────────────────────────────────────────

impl StructuredError {
    /// Replaces the recorded call site.
    pub fn with_stacktrace(mut self, stacktrace: Stacktrace) -> Self {
        self.stacktrace = stacktrace;
        self
    }

    /// Sets `key` to the single `value`, replacing anything stored before.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.set(key, value);
        self
    }

    /// Sets `key` to `values`, replacing anything stored before.
    pub fn with_meta_values<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.meta.put(key, values);
        self
    }

    /// Appends `cause` at the end of the chain.
    ///
    /// A [`StructuredError`] is attached as is, an [`ErrorList`] is attached
    /// member by member, and any other error is wrapped as a service error
    /// captured at the caller's location.
    ///
    /// Every `source()` of a plain error becomes a level of its own. An error
    /// whose `Display` already repeats its source therefore shows that text
    /// on two levels.
    #[track_caller]
    pub fn with_cause<E>(self, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.with_boxed_cause(Box::new(cause))
    }

    #[track_caller]
    pub fn with_boxed_cause(self, cause: Box<dyn Error + Send + Sync + 'static>) -> Self {
        match Self::from_boxed(cause) {
            Some(chain) => self.attach(chain),
            None => self,
        }
    }

    /// [`with_cause`](Self::with_cause) that leaves the error unchanged for
    /// `None`.
    #[track_caller]
    pub fn with_cause_opt<E>(self, cause: Option<E>) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        match cause {
            Some(cause) => self.with_cause(cause),
            None => self,
        }
    }

    pub(crate) fn attach(mut self, cause: StructuredError) -> Self {
        let mut slot = &mut self.cause;
        while let Some(node) = slot {
            slot = &mut node.cause;
        }
        *slot = Some(Box::new(cause));
        self
    }
}

// ── Containment ───────────────────────────────────────────────────

impl StructuredError {
    /// Whether `target` is present anywhere in the chain.
    ///
    /// A level matches when its message equals the target's message (the
    /// target's `message()` for structured errors, its `Display` text
    /// otherwise), or when the target is a structured error carrying the
    /// same non-empty id.
    pub fn contains(&self, target: &(dyn Error + 'static)) -> bool {
        match target.downcast_ref::<StructuredError>() {
            Some(structured) => self.chain().any(|level| {
                level.message == structured.message
                    || (!structured.id.is_empty() && level.id == structured.id)
            }),
            None => self.contains_message(&target.to_string()),
        }
    }

    /// `false` for `None`, [`contains`](Self::contains) otherwise.
    pub fn contains_opt(&self, target: Option<&(dyn Error + 'static)>) -> bool {
        target.is_some_and(|target| self.contains(target))
    }

    pub fn contains_message(&self, message: &str) -> bool {
        self.chain().any(|level| level.message == message)
    }

    pub fn contains_kind(&self, kind: Kind) -> bool {
        self.chain().any(|level| level.is_kind(kind))
    }
}

// ── Chain-wide trait impls ────────────────────────────────────────

impl StructuredError {
    fn clone_level(&self) -> Self {
        Self {
            id: self.id.clone(),
            code: self.code,
            name: self.name.clone(),
            message: self.message.clone(),
            meta: self.meta.clone(),
            stacktrace: self.stacktrace.clone(),
            cause: None,
        }
    }

    fn level_eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.code == other.code
            && self.name == other.name
            && self.message == other.message
            && self.meta == other.meta
            && self.stacktrace == other.stacktrace
    }
}

impl Clone for StructuredError {
    fn clone(&self) -> Self {
        let mut head = self.clone_level();
        let rest: Vec<Self> = self.causes().map(Self::clone_level).collect();
        let mut tail = None;
        for mut level in rest.into_iter().rev() {
            level.cause = tail;
            tail = Some(Box::new(level));
        }
        head.cause = tail;
        head
    }
}

impl PartialEq for StructuredError {
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.chain();
        let mut right = other.chain();
        loop {
            match (left.next(), right.next()) {
                (Some(a), Some(b)) if a.level_eq(b) => {}
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl Eq for StructuredError {}

impl Drop for StructuredError {
    fn drop(&mut self) {
        let mut next = self.cause.take();
        while let Some(mut node) = next {
            next = node.cause.take();
        }
    }
}

impl Error for StructuredError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn Error + 'static))
    }
}
