//! Reload failure taxonomy.

use std::fmt;
use thiserror::Error;

use crate::codec::DecodeError;
use crate::source::SourceError;

/// Why a reload cycle failed. The store is untouched in every case.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Coarse classification used for logs, metrics and exit decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SourceUnavailable,
    NotFound,
    Decode,
}

impl ReloadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReloadError::Source(SourceError::Unavailable { .. }) => ErrorKind::SourceUnavailable,
            ReloadError::Source(SourceError::NotFound { .. }) => ErrorKind::NotFound,
            ReloadError::Decode(_) => ErrorKind::Decode,
        }
    }
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::SourceUnavailable => "source_unavailable",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Decode => "decode",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
