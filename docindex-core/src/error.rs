//! Error type shared across the wire codec, document store, scan engine and
//! response cache.
//!
//! # Example
//!
//! ```
//! use docindex_core::DocIndexError;
//!
//! let err = DocIndexError::NotFound;
//! assert_eq!(err.to_string(), "not found");
//! ```

use std::error::Error;
use std::fmt;
use std::io;

/// Errors produced by the core subsystems.
///
/// `Shutdown` is deliberately not a variant here: it is a non-error outcome
/// of the `F` handler and is modeled as its own enum in `docindex-server`.
#[derive(Debug)]
pub enum DocIndexError {
    /// A builder or cursor operation would write past the frame's payload
    /// capacity.
    CapacityExceeded,
    /// A TLV value (or an encoded string) exceeds the 16-bit wire length
    /// limit.
    ValueTooLarge,
    /// A cursor encountered a TLV header whose declared length would read
    /// past the end of the payload.
    CorruptFrame,
    /// A decoded TLV did not match the expected argument type.
    TypeMismatch,
    /// A request's argument count fell outside `[argc_min, argc_max]`.
    ArityError,
    /// The requested key does not refer to a live document, or a cache
    /// lookup missed.
    NotFound,
    /// A document-store I/O invariant was violated (short read/write,
    /// offset past end of file).
    StorageError(String),
    /// The transport layer failed to read or write a whole frame.
    TransportError(String),
    /// An operation was attempted on an already-initialised resource.
    StateError,
    /// A lower-level I/O error not covered by a more specific variant.
    Io(io::Error),
}

impl fmt::Display for DocIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocIndexError::CapacityExceeded => write!(f, "capacity exceeded"),
            DocIndexError::ValueTooLarge => write!(f, "value too large"),
            DocIndexError::CorruptFrame => write!(f, "corrupt frame"),
            DocIndexError::TypeMismatch => write!(f, "argument type mismatch"),
            DocIndexError::ArityError => write!(f, "wrong number of arguments"),
            DocIndexError::NotFound => write!(f, "not found"),
            DocIndexError::StorageError(msg) => write!(f, "storage error: {msg}"),
            DocIndexError::TransportError(msg) => write!(f, "transport error: {msg}"),
            DocIndexError::StateError => write!(f, "invalid state"),
            DocIndexError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for DocIndexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DocIndexError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DocIndexError {
    fn from(e: io::Error) -> Self {
        DocIndexError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, DocIndexError>;
