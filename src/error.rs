// src/error.rs
// Error types for collaborator and handler operations

use thiserror::Error;

/// Everything that can go wrong between a handler and the Coder engine
#[derive(Error, Debug)]
pub enum CoderError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("File not in chat")]
    NotInChat,

    #[error("{0}")]
    Unsupported(String),

    #[error("{0}")]
    Conflict(String),

    #[error("no git repository found in {0}")]
    NoRepository(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error("engine timed out after {0} seconds")]
    Timeout(u64),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Result using CoderError
pub type Result<T> = std::result::Result<T, CoderError>;

impl CoderError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CoderError::InvalidInput(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CoderError::Conflict(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_in_chat_message() {
        assert_eq!(CoderError::NotInChat.to_string(), "File not in chat");
    }

    #[test]
    fn test_git_error_conversion() {
        let err: CoderError = git2::Error::from_str("bad revision").into();
        assert!(matches!(err, CoderError::Git(_)));
        assert!(err.to_string().contains("bad revision"));
    }
}
