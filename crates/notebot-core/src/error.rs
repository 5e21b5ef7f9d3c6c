//! Error types for notebot.

use thiserror::Error;

/// Result type alias using notebot's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notebot operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(i64),

    /// Resource exists but belongs to someone else
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Chat API answered with ok=false
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for both generic and note-specific not-found errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::NoteNotFound(_))
    }

    /// True when a deadline expired before the operation finished.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Error::Timeout(e.to_string());
        }
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("user 42".to_string());
        assert_eq!(err.to_string(), "Not found: user 42");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let err = Error::NoteNotFound(17);
        assert_eq!(err.to_string(), "Note not found: 17");
    }

    #[test]
    fn test_error_display_transport() {
        let err = Error::Transport("Bad Request: message is not modified".to_string());
        assert_eq!(
            err.to_string(),
            "Transport error: Bad Request: message is not modified"
        );
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout("create note".to_string());
        assert_eq!(err.to_string(), "Timeout: create note");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(Error::NoteNotFound(1).is_not_found());
        assert!(!Error::Forbidden("x".into()).is_not_found());
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::Timeout("x".into()).is_timeout());
        assert!(!Error::Internal("x".into()).is_timeout());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
