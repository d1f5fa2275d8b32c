//! Partial result carried alongside a read failure.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

/// A read that failed part-way through.
///
/// `data` holds whatever was gathered before the failure; it may be empty.
/// `source` is the error reported by the stream, unchanged. Callers decide
/// whether the partial data is still useful: a truncated variable block often
/// still parses into the variables that did arrive.
///
/// ```rust,ignore
/// match agi::read_variables(&mut stream).await {
///     Ok(vars) => route(&vars),
///     Err(partial) => {
///         debug!(error = %partial.source, "variable block cut short");
///         route(&partial.data)
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Incomplete<T> {
    /// Data read before the failure.
    pub data: T,
    /// The underlying I/O error.
    pub source: io::Error,
}

impl<T> Incomplete<T> {
    /// Pair partial `data` with the `source` error that interrupted it.
    #[must_use]
    pub fn new(data: T, source: io::Error) -> Self {
        Self { data, source }
    }

    /// Kind of the underlying I/O error.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }

    /// Split into the partial data and the I/O error.
    #[must_use]
    pub fn into_parts(self) -> (T, io::Error) {
        (self.data, self.source)
    }

    /// Transform the partial data, keeping the error.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Incomplete<U>
    where
        F: FnOnce(T) -> U,
    {
        Incomplete {
            data: f(self.data),
            source: self.source,
        }
    }
}

impl<T> Display for Incomplete<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "incomplete read: {}", self.source)
    }
}

impl<T: std::fmt::Debug> Error for Incomplete<T> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

impl<T> From<Incomplete<T>> for io::Error {
    fn from(partial: Incomplete<T>) -> Self {
        partial.source
    }
}
