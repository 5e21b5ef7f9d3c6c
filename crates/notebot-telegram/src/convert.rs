//! Mapping between Bot API types and notebot's chat vocabulary.

use tracing::{debug, warn};

use notebot_core::{defaults, ButtonAction, ChatEvent, Keyboard, Sender};

use crate::types::{InlineKeyboardButton, InlineKeyboardMarkup, Update, User};

fn sender_of(user: &User) -> Sender {
    Sender {
        id: user.id,
        name: user.display_name(),
    }
}

/// Command name of `/cmd@bot rest`, i.e. `"cmd"`.
///
/// Returns `None` when the text is not a command. Arguments are ignored.
pub fn parse_command(text: &str) -> Option<String> {
    let body = text.strip_prefix('/')?;
    let head = body.split(char::is_whitespace).next().unwrap_or(body);
    let command = head.split('@').next().unwrap_or(head);
    if command.is_empty() {
        return None;
    }
    Some(command.to_string())
}

impl Update {
    /// Convert to a chat event.
    ///
    /// Updates the bot does not act on (stickers, joins, edits, button
    /// presses without payload) yield `None`.
    pub fn into_event(self) -> Option<ChatEvent> {
        if let Some(query) = self.callback_query {
            let Some(data) = query.data else {
                debug!(
                    subsystem = "telegram",
                    update_id = self.update_id,
                    "Callback without data ignored"
                );
                return None;
            };
            let chat_id = query
                .message
                .as_ref()
                .map(|m| m.chat.id)
                .unwrap_or(query.from.id);
            return Some(ChatEvent::Callback {
                id: query.id,
                chat_id,
                sender: sender_of(&query.from),
                message_id: query.message.as_ref().map(|m| m.message_id),
                data,
            });
        }

        let message = self.message?;
        let from = message.from.as_ref()?;
        if from.is_bot {
            return None;
        }
        let sender = sender_of(from);
        let chat_id = message.chat.id;
        let text = message.text?;

        match parse_command(&text) {
            Some(command) => Some(ChatEvent::Command {
                chat_id,
                sender,
                command,
            }),
            None => Some(ChatEvent::Text {
                chat_id,
                sender,
                text,
            }),
        }
    }
}

impl From<&Keyboard> for InlineKeyboardMarkup {
    fn from(keyboard: &Keyboard) -> Self {
        let inline_keyboard = keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| match &button.action {
                        ButtonAction::Callback(data) => {
                            if data.len() > defaults::CALLBACK_DATA_MAX_BYTES {
                                warn!(
                                    subsystem = "telegram",
                                    bytes = data.len(),
                                    limit = defaults::CALLBACK_DATA_MAX_BYTES,
                                    "Callback payload exceeds platform limit"
                                );
                            }
                            InlineKeyboardButton {
                                text: button.text.clone(),
                                callback_data: Some(data.clone()),
                                url: None,
                            }
                        }
                        ButtonAction::Url(url) => InlineKeyboardButton {
                            text: button.text.clone(),
                            callback_data: None,
                            url: Some(url.clone()),
                        },
                    })
                    .collect()
            })
            .collect();
        Self { inline_keyboard }
    }
}
