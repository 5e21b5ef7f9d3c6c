//! # notebot-core
//!
//! Core types, traits, and abstractions for the notebot chat front end.
//!
//! This crate provides the domain model (users, notes, tags, drafts), the
//! chat-level message types shared by the transport and the bot, and the
//! trait seams ([`NoteStore`], [`ChatTransport`]) that concrete backends
//! implement.
//!
//! ## Log Level Contract
//!
//! All crates log through `tracing` with structured fields (`subsystem`,
//! `component`, `op`, `chat_id`, `user_id`, `note_id`, `route`, `status`).
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Storage/transport failure, ownership violation |
//! | WARN  | Malformed callback payload, recoverable fallback applied |
//! | INFO  | Lifecycle events, completed saves, updates and deletes |
//! | DEBUG | Routing decisions, state transitions |
//! | TRACE | Raw update payloads |

pub mod defaults;
pub mod error;
pub mod models;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use tags::{normalize_tags, split_tags, TagDiff};
pub use traits::*;
