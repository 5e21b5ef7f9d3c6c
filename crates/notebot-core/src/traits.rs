//! Core traits for notebot abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE STORE
// =============================================================================

/// Persistence for users, notes, tags, and note-tag links.
///
/// Multi-step writes are transactional: either every row is written or none.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Find a user by the chat platform's identifier.
    async fn get_user_by_external_id(&self, external_id: i64) -> Result<Option<User>>;

    /// Register a user, returning the internal identifier.
    async fn create_user(&self, external_id: i64, name: Option<&str>) -> Result<i64>;

    /// Fetch a note by identifier.
    async fn get_note(&self, id: i64) -> Result<Option<Note>>;

    /// All notes owned by a user, oldest first.
    async fn get_notes_by_user(&self, user_id: i64) -> Result<Vec<Note>>;

    /// Notes owned by a user that carry the given tag title.
    async fn get_notes_by_user_and_tag(&self, user_id: i64, tag: &str) -> Result<Vec<Note>>;

    /// Tags linked to a note.
    async fn get_tags_by_note(&self, note_id: i64) -> Result<Vec<Tag>>;

    /// All tags a user has created.
    async fn get_tags_by_user(&self, user_id: i64) -> Result<Vec<Tag>>;

    /// Insert a note and link its tags, creating missing tags on the way.
    async fn create_note_with_tags(&self, req: CreateNoteRequest) -> Result<i64>;

    /// Overwrite a note's scalar fields and apply the tag-set diff.
    ///
    /// The write is scoped to `note.user_id`; a note owned by someone else
    /// yields `Error::NoteNotFound`.
    async fn update_note_with_tag_diff(&self, note: &Note, new_tags: &[String]) -> Result<()>;

    /// Delete a note; its tag links go with it.
    async fn delete_note(&self, id: i64) -> Result<()>;

    /// Look up a user by external id, registering them if absent.
    async fn ensure_user(&self, external_id: i64, name: Option<&str>) -> Result<i64> {
        match self.get_user_by_external_id(external_id).await? {
            Some(user) => Ok(user.id),
            None => self.create_user(external_id, name).await,
        }
    }
}

// =============================================================================
// CHAT TRANSPORT
// =============================================================================

/// Outbound side of a chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a new message.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        options: MessageOptions,
    ) -> Result<SentMessage>;

    /// Replace the text and keyboard of an existing message.
    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        options: MessageOptions,
    ) -> Result<()>;

    /// Acknowledge a button press so the client stops its progress indicator.
    async fn answer_callback(&self, callback_id: &str) -> Result<()>;
}
