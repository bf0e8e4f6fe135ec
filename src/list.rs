use std::error::Error;
use std::fmt;

use crate::structured::StructuredError;

/// An ordered collection of errors gathered from independent operations.
///
/// Attaching a list as a cause, or calling [`into_error`](Self::into_error),
/// folds it into a single chain in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList {
    errors: Vec<StructuredError>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds any error, converting it the way [`wrap`](crate::wrap) does.
    /// Appending an empty list adds nothing.
    #[track_caller]
    pub fn append<E>(&mut self, err: E)
    where
        E: Error + Send + Sync + 'static,
    {
        if let Some(err) = StructuredError::from_boxed(Box::new(err)) {
            self.errors.push(err);
        }
    }

    pub fn push(&mut self, err: StructuredError) {
        self.errors.push(err);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StructuredError> {
        self.errors.iter()
    }

    /// The folded chain without consuming the list. `None` when empty.
    pub fn to_error(&self) -> Option<StructuredError> {
        self.clone().into_error()
    }

    /// Folds the members into one chain: the first member is the head and
    /// each later member is attached after the previous one's full chain.
    pub fn into_error(self) -> Option<StructuredError> {
        self.errors
            .into_iter()
            .rev()
            .reduce(|tail, head| head.attach(tail))
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(err.message())?;
        }
        Ok(())
    }
}

impl Error for ErrorList {}

impl From<ErrorList> for Option<StructuredError> {
    fn from(list: ErrorList) -> Self {
        list.into_error()
    }
}

impl IntoIterator for ErrorList {
    type Item = StructuredError;
    type IntoIter = std::vec::IntoIter<StructuredError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a StructuredError;
    type IntoIter = std::slice::Iter<'a, StructuredError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl FromIterator<StructuredError> for ErrorList {
    fn from_iter<T: IntoIterator<Item = StructuredError>>(iter: T) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl Extend<StructuredError> for ErrorList {
    fn extend<T: IntoIterator<Item = StructuredError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}
