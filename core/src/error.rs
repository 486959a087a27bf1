//! Error type shared by the registry, the composition state machine and the
//! data loaders.
//!
//! Every variant is recoverable. The bridge turns them into status flags and
//! messages inside a `RimeResult`; nothing here is allowed to become a panic.

use crate::registry::SessionId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The handle is not (or no longer) present in the registry.
    #[error("Invalid session ID")]
    InvalidSession(SessionId),

    /// Candidate selection outside `[0, len)`.
    #[error("Candidate index out of range")]
    OutOfRange { index: usize, len: usize },

    /// Commit requested while there are no candidates.
    #[error("Nothing to commit")]
    NothingToCommit,

    /// Session limit reached or the handle space is used up.
    #[error("Session capacity exhausted")]
    ResourceExhausted,

    #[error("Dictionary error: {0}")]
    Dictionary(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_session_message_is_fixed() {
        let err = Error::InvalidSession(SessionId::from_raw(42));
        assert_eq!(err.to_string(), "Invalid session ID");
    }

    #[test]
    fn out_of_range_message_ignores_index() {
        let err = Error::OutOfRange { index: 5, len: 3 };
        assert_eq!(err.to_string(), "Candidate index out of range");
    }
}
