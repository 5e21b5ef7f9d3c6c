//! Core data models for notebot.
//!
//! These types are shared across all notebot crates: persisted entities
//! (users, notes, tags), the session-local draft, and the chat-level
//! vocabulary (events, keyboards, message options) that sits between the
//! bot logic and a concrete chat transport.

use serde::{Deserialize, Serialize};

// =============================================================================
// PERSISTED ENTITIES
// =============================================================================

/// A registered chat user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal identifier.
    pub id: i64,
    /// Identifier assigned by the chat platform.
    pub external_id: i64,
    /// Display name at registration time.
    pub name: Option<String>,
}

/// A stored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
}

impl Note {
    /// The note's URL if it is set and non-empty.
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    /// Whether the note belongs to the given internal user.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

/// A per-user tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
}

/// Request for creating a note together with its tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateNoteRequest {
    pub user_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub description: Option<String>,
    /// Raw tag titles; normalised by the store before linking.
    pub tags: Vec<String>,
}

// =============================================================================
// DRAFT
// =============================================================================

/// A note being composed or edited inside a conversation.
///
/// `id == 0` means the draft has not been persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl Draft {
    /// Load an existing note and its tags into a draft for editing.
    pub fn from_note(note: &Note, tags: &[Tag]) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            url: note.url.clone().unwrap_or_default(),
            description: note.description.clone().unwrap_or_default(),
            tags: tags.iter().map(|t| t.title.clone()).collect(),
        }
    }

    /// Whether this draft refers to an existing note.
    pub fn is_persisted(&self) -> bool {
        self.id != 0
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Build the insert request for a new note owned by `user_id`.
    pub fn to_create_request(&self, user_id: i64) -> CreateNoteRequest {
        CreateNoteRequest {
            user_id,
            title: self.title.clone(),
            url: non_empty(&self.url),
            description: non_empty(&self.description),
            tags: self.tags.clone(),
        }
    }

    /// Build the full scalar overwrite for an existing note owned by `user_id`.
    pub fn to_note(&self, user_id: i64) -> Note {
        Note {
            id: self.id,
            user_id,
            title: self.title.clone(),
            url: non_empty(&self.url),
            description: non_empty(&self.description),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// =============================================================================
// CHAT VOCABULARY
// =============================================================================

/// The user who triggered a chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Platform user identifier; also the session key.
    pub id: i64,
    pub name: Option<String>,
}

/// An incoming chat event, already stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A `/command` message.
    Command {
        chat_id: i64,
        sender: Sender,
        command: String,
    },
    /// A free-text message.
    Text {
        chat_id: i64,
        sender: Sender,
        text: String,
    },
    /// An inline button press.
    Callback {
        /// Identifier used to acknowledge the callback.
        id: String,
        chat_id: i64,
        sender: Sender,
        /// Message carrying the pressed keyboard, when still available.
        message_id: Option<i64>,
        data: String,
    },
}

impl ChatEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            ChatEvent::Command { sender, .. }
            | ChatEvent::Text { sender, .. }
            | ChatEvent::Callback { sender, .. } => sender,
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            ChatEvent::Command { chat_id, .. }
            | ChatEvent::Text { chat_id, .. }
            | ChatEvent::Callback { chat_id, .. } => *chat_id,
        }
    }

    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::Command { .. } => "command",
            ChatEvent::Text { .. } => "text",
            ChatEvent::Callback { .. } => "callback",
        }
    }
}

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonAction {
    /// Sends the payload back to the bot as a callback.
    Callback(String),
    /// Opens a link directly in the client.
    Url(String),
}

/// A single inline button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    /// Callback payload, if this is a callback button.
    pub fn callback_data(&self) -> Option<&str> {
        match &self.action {
            ButtonAction::Callback(data) => Some(data),
            ButtonAction::Url(_) => None,
        }
    }
}

/// Rows of inline buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row. Empty rows are skipped.
    pub fn push_row(&mut self, row: Vec<Button>) {
        if !row.is_empty() {
            self.rows.push(row);
        }
    }

    pub fn with_row(mut self, row: Vec<Button>) -> Self {
        self.push_row(row);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over every button in row order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Find the first button whose callback payload equals `data`.
    pub fn find_callback(&self, data: &str) -> Option<&Button> {
        self.buttons().find(|b| b.callback_data() == Some(data))
    }
}

/// Options for an outgoing or edited message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOptions {
    pub keyboard: Option<Keyboard>,
    /// Render the text as MarkdownV2; the caller is responsible for escaping.
    pub markdown: bool,
}

impl MessageOptions {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    pub fn markdown(mut self) -> Self {
        self.markdown = true;
        self
    }
}

/// Result of a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: i64,
}
