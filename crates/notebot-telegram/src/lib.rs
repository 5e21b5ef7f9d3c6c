//! # notebot-telegram
//!
//! Telegram Bot API adapter for notebot.
//!
//! This crate provides:
//! - [`TelegramClient`], a [`notebot_core::ChatTransport`] over the Bot API
//! - Long-poll `getUpdates` and command registration
//! - Conversion of [`Update`]s into [`notebot_core::ChatEvent`]s
//! - MarkdownV2 escaping for user-supplied text
//!
//! # Example
//!
//! ```rust,no_run
//! use notebot_core::{ChatTransport, MessageOptions};
//! use notebot_telegram::{TelegramClient, TelegramConfig};
//!
//! #[tokio::main]
//! async fn main() -> notebot_core::Result<()> {
//!     let client = TelegramClient::new(TelegramConfig::new("123:token"))?;
//!     let mut offset = 0;
//!     for update in client.get_updates(offset).await? {
//!         offset = update.update_id + 1;
//!         if let Some(event) = update.into_event() {
//!             client
//!                 .send_message(event.chat_id(), "hi", MessageOptions::plain())
//!                 .await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod convert;
mod error;
mod markdown;
pub mod types;

pub use client::{TelegramClient, TelegramConfig};
pub use convert::parse_command;
pub use error::{to_notebot_error, TelegramErrorCode};
pub use markdown::escape_markdown;
pub use types::Update;
