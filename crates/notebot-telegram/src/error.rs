//! Telegram-specific error handling.

use notebot_core::Error;

/// Classified Bot API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelegramErrorCode {
    /// The bot token was rejected.
    Unauthorized,
    /// An edit would not change the message.
    NotModified,
    /// The user blocked the bot or the chat is gone.
    Forbidden,
    /// Another poller or a webhook is active for this token.
    Conflict,
    /// Flood control kicked in.
    RateLimited,
    /// Malformed request.
    BadRequest,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl TelegramErrorCode {
    /// Determine the error code from the `error_code` and `description` fields.
    pub fn from_response(code: i32, description: &str) -> Self {
        match code {
            401 | 404 => Self::Unauthorized,
            400 if description.contains("message is not modified") => Self::NotModified,
            400 => Self::BadRequest,
            403 => Self::Forbidden,
            409 => Self::Conflict,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerError | Self::Conflict)
    }
}

/// Convert a Bot API failure to a notebot Error.
pub fn to_notebot_error(code: TelegramErrorCode, method: &str, description: &str) -> Error {
    match code {
        TelegramErrorCode::Unauthorized => {
            Error::Config(format!("Telegram rejected the bot token: {}", description))
        }
        _ => Error::Transport(format!("{} failed: {}", method, description)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_not_modified() {
        let code = TelegramErrorCode::from_response(
            400,
            "Bad Request: message is not modified: specified new message content and reply markup are exactly the same",
        );
        assert_eq!(code, TelegramErrorCode::NotModified);
    }

    #[test]
    fn test_from_response_other_bad_request() {
        let code = TelegramErrorCode::from_response(400, "Bad Request: chat not found");
        assert_eq!(code, TelegramErrorCode::BadRequest);
        assert!(!code.is_retryable());
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        assert!(TelegramErrorCode::from_response(429, "Too Many Requests").is_retryable());
    }

    #[test]
    fn test_unauthorized_maps_to_config_error() {
        let err = to_notebot_error(TelegramErrorCode::Unauthorized, "getMe", "Unauthorized");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_other_codes_map_to_transport_error() {
        let err = to_notebot_error(
            TelegramErrorCode::Forbidden,
            "sendMessage",
            "Forbidden: bot was blocked by the user",
        );
        assert_eq!(
            err.to_string(),
            "Transport error: sendMessage failed: Forbidden: bot was blocked by the user"
        );
    }
}
