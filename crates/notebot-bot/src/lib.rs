//! # notebot-bot
//!
//! Conversational front end of notebot.
//!
//! This crate provides:
//! - [`Status`] and the pure transition function [`on_text`] driving note
//!   composition and editing
//! - [`SessionStore`] with the single-mutex [`MemorySessionStore`]
//! - Keyboard builders for paginated note lists, tag menus and flow menus
//! - [`Route`] parsing of callback payloads
//! - [`App`], which dispatches chat events against a [`notebot_core::NoteStore`]
//!   and a [`notebot_core::ChatTransport`]
//! - [`Poller`], the long-polling loop, and [`BotConfig`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use notebot_bot::{App, BotConfig, MemorySessionStore};
//! use notebot_core::{ChatEvent, Sender};
//! use notebot_db::MemoryNoteStore;
//! use notebot_telegram::TelegramClient;
//!
//! #[tokio::main]
//! async fn main() -> notebot_core::Result<()> {
//!     let app = App::new(
//!         Arc::new(MemoryNoteStore::new()),
//!         Arc::new(TelegramClient::new(BotConfig::from_env()?.telegram)?),
//!         Arc::new(MemorySessionStore::new()),
//!     );
//!     app.handle(ChatEvent::Command {
//!         chat_id: 70,
//!         sender: Sender { id: 7, name: None },
//!         command: "start".to_string(),
//!     })
//!     .await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod handlers;
pub mod keyboard;
pub mod messages;
pub mod poller;
pub mod router;
pub mod session;
pub mod state;

pub use config::{BotConfig, DatabaseConfig};
pub use handlers::App;
pub use keyboard::{page_window, ListContext};
pub use poller::Poller;
pub use router::{Command, ComposeAction, EditAction, Route};
pub use session::{MemorySessionStore, Session, SessionStore};
pub use state::{on_text, Field, Flow, Prompt, Status, Step};
