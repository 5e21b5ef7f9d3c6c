//! Callback payload routes and chat commands.
//!
//! A callback payload is `"<route tag> <args...>"`. The route tag is matched
//! against the first whitespace-separated token exactly, so no tag can
//! shadow another. Unknown tags parse to `None` and are dropped; malformed
//! arguments log a warning and fall back to a harmless default.

use std::fmt;

use tracing::warn;

use crate::state::Field;

const LIST_ALL: &str = "_list_all";
const LIST_PREV: &str = "_list_prev";
const LIST_NEXT: &str = "_list_next";
const SHOW: &str = "_show";
const SHOW_BY_TAG: &str = "_show_by_tag";
const NEW: &str = "_new";
const EDIT: &str = "_edit_";
const EDITING: &str = "_editing";
const DELETE: &str = "_delete";
const SEARCH_TAG: &str = "_search_by_tag_all";
const SEARCH_TAG_PREV: &str = "_search_by_tag_prev";
const SEARCH_TAG_NEXT: &str = "_search_by_tag_next";

/// Shortcut pressed on the compose menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    /// Start a fresh note at the title prompt.
    Begin,
    Jump(Field),
    Save,
}

/// Shortcut pressed on the edit menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Jump(Field),
    Update,
}

/// Parsed callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ListAll,
    ListPrev,
    ListNext,
    Show(i64),
    ShowByTag(i64),
    New(ComposeAction),
    Edit(i64),
    /// `None` when the payload names no known edit shortcut.
    Editing(Option<EditAction>),
    Delete(i64),
    SearchByTag(String),
    SearchByTagPrev,
    SearchByTagNext,
}

fn parse_id(tag: &str, arg: Option<&str>, data: &str) -> i64 {
    match arg.map(str::parse::<i64>) {
        Some(Ok(id)) => id,
        _ => {
            warn!(
                subsystem = "bot",
                component = "router",
                route = tag,
                payload = data,
                "Malformed note id in callback payload, using 0"
            );
            0
        }
    }
}

fn parse_field(arg: &str) -> Option<Field> {
    match arg {
        "title" => Some(Field::Title),
        "url" => Some(Field::Url),
        "description" => Some(Field::Description),
        "tags" => Some(Field::Tags),
        _ => None,
    }
}

impl Route {
    /// Parse a callback payload. Unknown route tags yield `None`.
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split_whitespace();
        let tag = parts.next()?;
        let arg = parts.next();

        let route = match tag {
            LIST_ALL => Route::ListAll,
            LIST_PREV => Route::ListPrev,
            LIST_NEXT => Route::ListNext,
            SHOW => Route::Show(parse_id(tag, arg, data)),
            SHOW_BY_TAG => Route::ShowByTag(parse_id(tag, arg, data)),
            NEW => Route::New(match arg {
                None => ComposeAction::Begin,
                Some("save") => ComposeAction::Save,
                Some(other) => match parse_field(other) {
                    Some(Field::Title) | None => {
                        warn!(
                            subsystem = "bot",
                            component = "router",
                            route = tag,
                            payload = data,
                            "Unknown compose shortcut, starting a new note"
                        );
                        ComposeAction::Begin
                    }
                    Some(field) => ComposeAction::Jump(field),
                },
            }),
            EDIT => Route::Edit(parse_id(tag, arg, data)),
            EDITING => Route::Editing(match arg {
                Some("update") => Some(EditAction::Update),
                Some(other) => parse_field(other).map(EditAction::Jump),
                None => None,
            }),
            DELETE => Route::Delete(parse_id(tag, arg, data)),
            SEARCH_TAG => Route::SearchByTag(arg.unwrap_or_default().to_string()),
            SEARCH_TAG_PREV => Route::SearchByTagPrev,
            SEARCH_TAG_NEXT => Route::SearchByTagNext,
            _ => return None,
        };
        Some(route)
    }

    /// The leading token of the payload.
    pub fn tag(&self) -> &'static str {
        match self {
            Route::ListAll => LIST_ALL,
            Route::ListPrev => LIST_PREV,
            Route::ListNext => LIST_NEXT,
            Route::Show(_) => SHOW,
            Route::ShowByTag(_) => SHOW_BY_TAG,
            Route::New(_) => NEW,
            Route::Edit(_) => EDIT,
            Route::Editing(_) => EDITING,
            Route::Delete(_) => DELETE,
            Route::SearchByTag(_) => SEARCH_TAG,
            Route::SearchByTagPrev => SEARCH_TAG_PREV,
            Route::SearchByTagNext => SEARCH_TAG_NEXT,
        }
    }
}

/// Renders the callback payload for this route.
impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag();
        match self {
            Route::Show(id) | Route::ShowByTag(id) | Route::Edit(id) | Route::Delete(id) => {
                write!(f, "{} {}", tag, id)
            }
            Route::New(ComposeAction::Jump(field)) => write!(f, "{} {}", tag, field.as_str()),
            Route::New(ComposeAction::Save) => write!(f, "{} save", tag),
            Route::Editing(Some(EditAction::Jump(field))) => {
                write!(f, "{} {}", tag, field.as_str())
            }
            Route::Editing(Some(EditAction::Update)) => write!(f, "{} update", tag),
            Route::SearchByTag(name) => write!(f, "{} {}", tag, name),
            _ => f.write_str(tag),
        }
    }
}

/// Slash commands the bot answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    New,
    List,
    Tags,
}

impl Command {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Command::Start),
            "new" => Some(Command::New),
            "list" => Some(Command::List),
            "tags" => Some(Command::Tags),
            _ => None,
        }
    }
}
