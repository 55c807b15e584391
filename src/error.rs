use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Search
    #[error("invalid pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("walk error: {0}")]
    Walk(String),

    #[error("IO error")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Process
    #[error("process pipe error")]
    Pipe(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether a caller could reasonably carry on after this error.
    ///
    /// A bad pattern fails the same way on every retry. IO and walk failures
    /// depend on the file system and may not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Walk(_) | Self::Pipe(_))
    }
}
