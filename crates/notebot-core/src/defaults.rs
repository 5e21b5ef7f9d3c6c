//! Centralized default constants for notebot.
//!
//! All crates reference these constants instead of defining their own
//! magic numbers.

use std::time::Duration;

// =============================================================================
// NOTE BROWSER
// =============================================================================

/// Notes shown per page of the list keyboard.
pub const LIST_PAGE_SIZE: usize = 5;

/// Tag buttons per row of the tags menu.
pub const TAG_ROW_WIDTH: usize = 3;

// =============================================================================
// STORAGE
// =============================================================================

/// Deadline in seconds for a multi-step store write.
pub const STORE_WRITE_TIMEOUT_SECS: u64 = 10;

/// Deadline for a multi-step store write.
pub const STORE_WRITE_TIMEOUT: Duration = Duration::from_secs(STORE_WRITE_TIMEOUT_SECS);

/// Default database host.
pub const DB_HOST: &str = "localhost";

/// Default database port.
pub const DB_PORT: u16 = 5432;

/// Default database user.
pub const DB_USER: &str = "postgres";

/// Default database name.
pub const DB_NAME: &str = "notebot";

/// Default maximum number of pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

// =============================================================================
// TELEGRAM
// =============================================================================

/// Default Telegram Bot API base URL.
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Long-poll timeout for getUpdates, in seconds.
pub const POLL_TIMEOUT_SECS: u64 = 30;

/// Extra slack on top of the long-poll timeout for the HTTP request itself.
pub const HTTP_TIMEOUT_SLACK_SECS: u64 = 10;

/// Pause after a failed getUpdates call before polling again.
pub const POLL_ERROR_BACKOFF_MS: u64 = 1000;

/// Telegram rejects callback_data longer than this many bytes.
pub const CALLBACK_DATA_MAX_BYTES: usize = 64;

/// Commands registered with the chat platform.
pub const BOT_COMMANDS: &[(&str, &str)] = &[
    ("start", "start working with the bot"),
    ("list", "show all notes"),
    ("new", "add a note"),
    ("tags", "your tags"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_timeout_matches_secs() {
        assert_eq!(STORE_WRITE_TIMEOUT.as_secs(), STORE_WRITE_TIMEOUT_SECS);
    }

    #[test]
    fn test_bot_commands_registered() {
        let names: Vec<&str> = BOT_COMMANDS.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["start", "list", "new", "tags"]);
    }
}
