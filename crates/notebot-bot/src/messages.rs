//! User-facing texts.
//!
//! Texts sent with markdown enabled are MarkdownV2; anything user-supplied
//! goes through [`escape_markdown`] first.

use notebot_core::Draft;
use notebot_telegram::escape_markdown;

use crate::state::{Field, Prompt};

pub const GREETING: &str =
    "Hi! I keep your notes: links, descriptions and tags. Pick an option below.";
pub const LOADING: &str = "Loading...";
/// MarkdownV2 header of the plain note list.
pub const LIST_HEADER: &str = "*Notes:*";
pub const NOTE_SAVED: &str = "Note saved";
pub const NOTE_UPDATED: &str = "Note updated";
pub const NOTE_NOT_FOUND: &str = "Note not found";
pub const NOTE_NOT_SELECTED: &str = "Note not selected";
pub const NO_TAG_SELECTED: &str = "No tag selected";
pub const YOUR_TAGS: &str = "Your tags";
pub const NO_TAGS: &str = "You have no tags yet";
pub const SERVER_ERROR: &str = "Server error, please try again later";
pub const SAVE_ERROR: &str = "Could not save the note. Your draft is kept, press Save to retry.";
pub const UPDATE_ERROR: &str =
    "Could not update the note. Your changes are kept, press Update to retry.";

pub fn prompt(prompt: Prompt) -> &'static str {
    match prompt {
        Prompt::Field(Field::Title) => "Enter a title:",
        Prompt::Field(Field::Url) => "Enter a link:",
        Prompt::Field(Field::Description) => "Add a description:",
        Prompt::Field(Field::Tags) => "Add tags (separated by spaces):",
        Prompt::InvalidUrl => "That does not look like a link, e.g. https://example.com. Enter a link:",
    }
}

/// Header of a tag-filtered list. Sent as plain text.
pub fn tag_header(tag: &str) -> String {
    format!("Notes tagged \"{}\"", tag)
}

pub fn note_deleted(title: &str) -> String {
    format!("Note \"{}\" deleted", title)
}

/// Placeholder for an empty field, escaped for MarkdownV2.
const EMPTY_FIELD: &str = "\\-";

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        EMPTY_FIELD.to_string()
    } else {
        escape_markdown(value)
    }
}

/// MarkdownV2 card of a note, `-` standing in for empty fields.
pub fn note_detail(draft: &Draft) -> String {
    format!(
        "*Title:* {}\n*URL:* {}\n*Description:* {}\n*Tags:* {}",
        or_dash(&draft.title),
        or_dash(&draft.url),
        or_dash(&draft.description),
        or_dash(&draft.tags.join(" "))
    )
}
