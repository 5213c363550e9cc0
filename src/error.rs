//! Error type and the raise policy shared by every container.

use std::fmt;
use thiserror::Error;

/// Error conditions raised by the containers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A mutating operation would exceed a fixed capacity.
    #[error("capacity exceeded (capacity is {capacity})")]
    CapacityExceeded {
        /// The fixed capacity that was reached.
        capacity: usize,
    },
    /// A bounds-checked accessor was given an invalid index.
    #[error("index {index} out of range for length {len}")]
    OutOfRange {
        /// The rejected index.
        index: usize,
        /// Number of elements at the time of the access.
        len: usize,
    },
    /// The allocator could not satisfy a request.
    #[error("allocation of {size} bytes failed")]
    AllocFailed {
        /// Requested size in bytes.
        size: usize,
    },
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error returned by operations that take ownership of an element and could not store it.
/// The element is handed back unchanged.
#[derive(Error, Clone, PartialEq, Eq)]
#[error("{error}")]
pub struct InsertError<T> {
    error: Error,
    element: T,
}

impl<T> InsertError<T> {
    pub(crate) fn new(error: Error, element: T) -> Self {
        Self {
            error: raise(error),
            element,
        }
    }

    /// The reason the element was rejected.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Recover the element that was not inserted.
    pub fn into_element(self) -> T {
        self.element
    }

    /// Split into the error and the element.
    pub fn into_parts(self) -> (Error, T) {
        (self.error, self.element)
    }
}

impl<T> fmt::Debug for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> From<InsertError<T>> for Error {
    fn from(e: InsertError<T>) -> Self {
        e.error
    }
}

/// Every error the crate reports passes through here, so the
/// `abort-on-error` feature can turn them into a fatal abort.
#[cfg(not(feature = "abort-on-error"))]
#[inline]
pub(crate) fn raise(error: Error) -> Error {
    error
}

/// Every error the crate reports passes through here, so the
/// `abort-on-error` feature can turn them into a fatal abort.
#[cfg(feature = "abort-on-error")]
#[cold]
pub(crate) fn raise(error: Error) -> Error {
    log::error!("fatal container error: {error}");
    debug_assert!(false, "{error}");
    std::process::abort()
}

/// Shorthand for `Err(raise(error))`.
#[inline]
pub(crate) fn fail<T>(error: Error) -> Result<T> {
    Err(raise(error))
}
