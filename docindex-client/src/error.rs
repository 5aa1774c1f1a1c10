use thiserror::Error;

use docindex_core::DocIndexError;

/// Client-side errors. Anything that already has a `DocIndexError` shape
/// (transport failures, a corrupt reply frame, a type mismatch) is
/// carried through as-is; the two variants here are purely local to the
/// CLI invocation.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("timed out waiting for a response")]
    Timeout,

    #[error(transparent)]
    Core(#[from] DocIndexError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
