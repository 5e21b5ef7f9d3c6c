//! Conversation state machine.
//!
//! A session's [`Status`] decides which draft field the next free-text
//! message fills. Transitions are pure: [`on_text`] takes the current status
//! and draft by value and returns a [`Step`] describing the new status, the
//! updated draft, and what the handler should do next. All I/O happens in
//! the handlers.

use std::fmt;

use notebot_core::{split_tags, Draft};

/// Where a user is in the compose or edit flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// Idle; free text is ignored.
    #[default]
    None,
    New,
    NewUrl,
    NewDescription,
    NewTags,
    Edit,
    EditUrl,
    EditDescription,
    EditTags,
}

/// Which menu accompanies a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Creating a new note; finalised with save.
    Compose,
    /// Changing an existing note; finalised with update.
    Edit,
}

/// A draft field the user can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Url,
    Description,
    Tags,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Url => "url",
            Field::Description => "description",
            Field::Tags => "tags",
        }
    }
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::None => "none",
            Status::New => "new",
            Status::NewUrl => "new_url",
            Status::NewDescription => "new_description",
            Status::NewTags => "new_tags",
            Status::Edit => "edit",
            Status::EditUrl => "edit_url",
            Status::EditDescription => "edit_description",
            Status::EditTags => "edit_tags",
        }
    }

    /// The flow this status belongs to, `None` when idle.
    pub fn flow(&self) -> Option<Flow> {
        match self {
            Status::None => None,
            Status::New | Status::NewUrl | Status::NewDescription | Status::NewTags => {
                Some(Flow::Compose)
            }
            Status::Edit | Status::EditUrl | Status::EditDescription | Status::EditTags => {
                Some(Flow::Edit)
            }
        }
    }

    /// The draft field the next free-text message fills.
    pub fn field(&self) -> Option<Field> {
        match self {
            Status::None => None,
            Status::New | Status::Edit => Some(Field::Title),
            Status::NewUrl | Status::EditUrl => Some(Field::Url),
            Status::NewDescription | Status::EditDescription => Some(Field::Description),
            Status::NewTags | Status::EditTags => Some(Field::Tags),
        }
    }

    /// The status that waits for `field` within `flow`.
    pub fn awaiting(flow: Flow, field: Field) -> Self {
        match (flow, field) {
            (Flow::Compose, Field::Title) => Status::New,
            (Flow::Compose, Field::Url) => Status::NewUrl,
            (Flow::Compose, Field::Description) => Status::NewDescription,
            (Flow::Compose, Field::Tags) => Status::NewTags,
            (Flow::Edit, Field::Title) => Status::Edit,
            (Flow::Edit, Field::Url) => Status::EditUrl,
            (Flow::Edit, Field::Description) => Status::EditDescription,
            (Flow::Edit, Field::Tags) => Status::EditTags,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Field(Field),
    /// The last URL was rejected; ask again.
    InvalidUrl,
}

/// Outcome of feeding a free-text message to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Idle session; nothing to do.
    Ignore,
    /// Move to `status` and send `prompt` with the flow's menu.
    Ask {
        status: Status,
        draft: Draft,
        prompt: Prompt,
    },
    /// The draft is complete; persist it in the given flow.
    Finish { flow: Flow, draft: Draft },
}

/// True when `text` is an absolute URI with a scheme.
pub fn is_valid_url(text: &str) -> bool {
    url::Url::parse(text).is_ok()
}

/// Advance the conversation by one free-text message.
pub fn on_text(status: Status, draft: Draft, text: &str) -> Step {
    let (Some(flow), Some(field)) = (status.flow(), status.field()) else {
        return Step::Ignore;
    };

    match field {
        Field::Title => Step::Ask {
            status: Status::awaiting(flow, Field::Url),
            draft: draft.with_title(text),
            prompt: Prompt::Field(Field::Url),
        },
        Field::Url if !is_valid_url(text) => Step::Ask {
            status,
            draft,
            prompt: Prompt::InvalidUrl,
        },
        Field::Url => Step::Ask {
            status: Status::awaiting(flow, Field::Description),
            draft: draft.with_url(text),
            prompt: Prompt::Field(Field::Description),
        },
        Field::Description => Step::Ask {
            status: Status::awaiting(flow, Field::Tags),
            draft: draft.with_description(text),
            prompt: Prompt::Field(Field::Tags),
        },
        Field::Tags => Step::Finish {
            flow,
            draft: draft.with_tags(split_tags(text)),
        },
    }
}

/// Status to resume at after a failed save or update.
///
/// The draft is kept, so the user can retry from the tags step.
pub fn after_failed_finish(flow: Flow) -> Status {
    Status::awaiting(flow, Field::Tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(step: Step) -> (Status, Draft, Prompt) {
        match step {
            Step::Ask {
                status,
                draft,
                prompt,
            } => (status, draft, prompt),
            other => panic!("expected Ask, got {:?}", other),
        }
    }

    #[test]
    fn test_idle_ignores_text() {
        assert_eq!(on_text(Status::None, Draft::default(), "hello"), Step::Ignore);
    }

    #[test]
    fn test_title_accepts_empty_text() {
        let (status, draft, prompt) = ask(on_text(Status::New, Draft::default(), ""));
        assert_eq!(status, Status::NewUrl);
        assert_eq!(draft.title, "");
        assert_eq!(prompt, Prompt::Field(Field::Url));
    }

    #[test]
    fn test_invalid_url_keeps_status_and_draft() {
        let draft = Draft::default().with_title("Groceries");
        let (status, kept, prompt) = ask(on_text(Status::NewUrl, draft.clone(), "milk eggs"));
        assert_eq!(status, Status::NewUrl);
        assert_eq!(kept, draft);
        assert_eq!(prompt, Prompt::InvalidUrl);
    }

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("https://list.example/path?q=1"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_compose_chain() {
        let (status, draft, _) = ask(on_text(Status::New, Draft::default(), "Groceries"));
        assert_eq!(status, Status::NewUrl);
        let (status, draft, _) = ask(on_text(status, draft, "https://list.example"));
        assert_eq!(status, Status::NewDescription);
        let (status, draft, prompt) = ask(on_text(status, draft, "Weekly shop"));
        assert_eq!(status, Status::NewTags);
        assert_eq!(prompt, Prompt::Field(Field::Tags));

        match on_text(status, draft, "food errand") {
            Step::Finish { flow, draft } => {
                assert_eq!(flow, Flow::Compose);
                assert_eq!(draft.title, "Groceries");
                assert_eq!(draft.url, "https://list.example");
                assert_eq!(draft.description, "Weekly shop");
                assert_eq!(draft.tags, vec!["food".to_string(), "errand".to_string()]);
            }
            other => panic!("expected Finish, got {:?}", other),
        }
    }

    #[test]
    fn test_edit_chain_mirrors_compose() {
        let draft = Draft {
            id: 9,
            ..Default::default()
        };
        let (status, draft, _) = ask(on_text(Status::Edit, draft, "Renamed"));
        assert_eq!(status, Status::EditUrl);
        let (status, draft, _) = ask(on_text(status, draft, "https://x.example"));
        assert_eq!(status, Status::EditDescription);
        let (status, draft, _) = ask(on_text(status, draft, "desc"));
        assert_eq!(status, Status::EditTags);

        match on_text(status, draft, "a  b") {
            Step::Finish { flow, draft } => {
                assert_eq!(flow, Flow::Edit);
                assert_eq!(draft.id, 9);
                assert_eq!(draft.tags, vec!["a", "", "b"]);
            }
            other => panic!("expected Finish, got {:?}", other),
        }
    }

    #[test]
    fn test_status_field_round_trip() {
        for flow in [Flow::Compose, Flow::Edit] {
            for field in [Field::Title, Field::Url, Field::Description, Field::Tags] {
                let status = Status::awaiting(flow, field);
                assert_eq!(status.flow(), Some(flow));
                assert_eq!(status.field(), Some(field));
            }
        }
    }

    #[test]
    fn test_failed_finish_resumes_at_tags() {
        assert_eq!(after_failed_finish(Flow::Compose), Status::NewTags);
        assert_eq!(after_failed_finish(Flow::Edit), Status::EditTags);
    }
}
