//! Inline keyboard builders.
//!
//! Note lists are paginated with a fixed page size. The plain list and the
//! tag-filtered list share the windowing logic but use distinct prev/next
//! routes, so a page flip in one context never lands in the other.

use std::ops::Range;

use notebot_core::defaults::{CALLBACK_DATA_MAX_BYTES, LIST_PAGE_SIZE, TAG_ROW_WIDTH};
use notebot_core::{Button, Keyboard, Note};
use tracing::warn;

use crate::router::{ComposeAction, EditAction, Route};
use crate::state::Field;

const EDIT_ICON: &str = "📝";
const LINK_ICON: &str = "📖";
const DELETE_ICON: &str = "❌";
const PREV_LABEL: &str = "<<";
const NEXT_LABEL: &str = ">>";

/// Which list a note keyboard belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListContext {
    /// Every note of the user.
    All,
    /// Notes carrying the session's active tag.
    Tag,
}

impl ListContext {
    fn show(self, id: i64) -> Route {
        match self {
            ListContext::All => Route::Show(id),
            ListContext::Tag => Route::ShowByTag(id),
        }
    }

    fn prev(self) -> Route {
        match self {
            ListContext::All => Route::ListPrev,
            ListContext::Tag => Route::SearchByTagPrev,
        }
    }

    fn next(self) -> Route {
        match self {
            ListContext::All => Route::ListNext,
            ListContext::Tag => Route::SearchByTagNext,
        }
    }
}

/// Half-open index window of `page` over a list of `len` items.
///
/// Always satisfies `start <= end <= len` and `end - start <= LIST_PAGE_SIZE`.
pub fn page_window(len: usize, page: usize) -> Range<usize> {
    let start = page.saturating_mul(LIST_PAGE_SIZE).min(len);
    let end = start.saturating_add(LIST_PAGE_SIZE).min(len);
    start..end
}

/// Render one page of notes with per-note actions and a pagination row.
pub fn note_list(notes: &[Note], page: usize, context: ListContext) -> Keyboard {
    let window = page_window(notes.len(), page);
    let mut keyboard = Keyboard::new();

    for note in &notes[window.clone()] {
        keyboard.push_row(vec![Button::callback(
            note.title.clone(),
            context.show(note.id).to_string(),
        )]);

        let mut actions = vec![Button::callback(EDIT_ICON, Route::Edit(note.id).to_string())];
        if let Some(link) = note.link() {
            actions.push(Button::url(LINK_ICON, link));
        }
        actions.push(Button::callback(
            DELETE_ICON,
            Route::Delete(note.id).to_string(),
        ));
        keyboard.push_row(actions);
    }

    let mut controls = Vec::new();
    if page > 0 {
        controls.push(Button::callback(PREV_LABEL, context.prev().to_string()));
    }
    if window.end < notes.len() {
        controls.push(Button::callback(NEXT_LABEL, context.next().to_string()));
    }
    keyboard.push_row(controls);

    keyboard
}

/// Shortcuts shown alongside every prompt of the compose flow.
pub fn compose_menu() -> Keyboard {
    let jump = |label: &str, field: Field| {
        Button::callback(label, Route::New(ComposeAction::Jump(field)).to_string())
    };
    Keyboard::new()
        .with_row(vec![
            jump("URL", Field::Url),
            jump("Description", Field::Description),
            jump("Tags", Field::Tags),
        ])
        .with_row(vec![Button::callback(
            "Save",
            Route::New(ComposeAction::Save).to_string(),
        )])
}

/// Shortcuts shown alongside every prompt of the edit flow.
pub fn edit_menu() -> Keyboard {
    let jump = |label: &str, field: Field| {
        Button::callback(
            label,
            Route::Editing(Some(EditAction::Jump(field))).to_string(),
        )
    };
    Keyboard::new()
        .with_row(vec![
            jump("Title", Field::Title),
            jump("URL", Field::Url),
            jump("Description", Field::Description),
            jump("Tags", Field::Tags),
        ])
        .with_row(vec![Button::callback(
            "Update",
            Route::Editing(Some(EditAction::Update)).to_string(),
        )])
}

/// One button per tag, `TAG_ROW_WIDTH` per row.
///
/// Tags whose search payload would exceed the platform's callback limit are
/// left out; a single oversized button makes the whole message fail.
pub fn tags_menu(tags: &[String]) -> Keyboard {
    let buttons: Vec<Button> = tags
        .iter()
        .filter_map(|tag| {
            let data = Route::SearchByTag(tag.clone()).to_string();
            if data.len() > CALLBACK_DATA_MAX_BYTES {
                warn!(
                    subsystem = "bot",
                    component = "keyboard",
                    bytes = data.len(),
                    "Tag too long for a button, omitted"
                );
                return None;
            }
            Some(Button::callback(tag.clone(), data))
        })
        .collect();

    let mut keyboard = Keyboard::new();
    for chunk in buttons.chunks(TAG_ROW_WIDTH) {
        keyboard.push_row(chunk.to_vec());
    }
    keyboard
}

/// Entry menu sent with the greeting.
pub fn start_menu() -> Keyboard {
    Keyboard::new().with_row(vec![
        Button::callback("Notes", Route::ListAll.to_string()),
        Button::callback("New note", Route::New(ComposeAction::Begin).to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(n: usize) -> Vec<Note> {
        (1..=n as i64)
            .map(|id| Note {
                id,
                user_id: 1,
                title: format!("note {}", id),
                url: None,
                description: None,
            })
            .collect()
    }

    fn has(keyboard: &Keyboard, data: &str) -> bool {
        keyboard.find_callback(data).is_some()
    }

    #[test]
    fn test_window_bounds_hold_for_all_pages() {
        for len in 0..=17 {
            for page in 0..=6 {
                let w = page_window(len, page);
                assert!(w.start <= w.end, "len={} page={}", len, page);
                assert!(w.end <= len);
                assert!(w.end - w.start <= LIST_PAGE_SIZE);
            }
        }
    }

    #[test]
    fn test_window_survives_huge_page() {
        assert_eq!(page_window(3, usize::MAX), 3..3);
    }

    #[test]
    fn test_pagination_buttons_appear_exactly_when_needed() {
        for len in 0..=12 {
            for page in 0..=3 {
                let kb = note_list(&notes(len), page, ListContext::All);
                let end = page_window(len, page).end;
                assert_eq!(has(&kb, "_list_prev"), page > 0, "len={} page={}", len, page);
                assert_eq!(has(&kb, "_list_next"), end < len, "len={} page={}", len, page);
            }
        }
    }

    #[test]
    fn test_tag_page_past_end_is_empty_without_next() {
        let kb = note_list(&notes(3), 1, ListContext::Tag);
        assert_eq!(page_window(3, 1), 3..3);
        assert!(!kb.buttons().any(|b| b.text.starts_with("note")));
        assert!(has(&kb, "_search_by_tag_prev"));
        assert!(!has(&kb, "_search_by_tag_next"));
    }

    #[test]
    fn test_contexts_use_distinct_routes() {
        let all = note_list(&notes(12), 1, ListContext::All);
        let tag = note_list(&notes(12), 1, ListContext::Tag);
        assert!(has(&all, "_list_next") && !has(&all, "_search_by_tag_next"));
        assert!(has(&tag, "_search_by_tag_next") && !has(&tag, "_list_next"));
        assert!(has(&all, "_show 6"));
        assert!(has(&tag, "_show_by_tag 6"));
    }

    #[test]
    fn test_note_rows_and_link_button() {
        let mut list = notes(2);
        list[0].url = Some("https://list.example".to_string());
        list[1].url = Some(String::new());
        let kb = note_list(&list, 0, ListContext::All);

        // Title row + action row per note, no controls.
        assert_eq!(kb.rows.len(), 4);
        assert_eq!(kb.rows[1].len(), 3);
        assert_eq!(kb.rows[1][1], Button::url(LINK_ICON, "https://list.example"));
        assert_eq!(kb.rows[3].len(), 2);
        assert!(has(&kb, "_edit_ 2"));
        assert!(has(&kb, "_delete 2"));
    }

    #[test]
    fn test_tags_menu_three_per_row() {
        let tags: Vec<String> = ["a", "b", "c", "d", "e", "f", "g"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let kb = tags_menu(&tags);
        let widths: Vec<usize> = kb.rows.iter().map(Vec::len).collect();
        assert_eq!(widths, vec![3, 3, 1]);
        assert!(has(&kb, "_search_by_tag_all g"));
        assert!(tags_menu(&[]).is_empty());
    }

    #[test]
    fn test_tags_menu_omits_oversized_payloads() {
        let long = "x".repeat(60);
        let tags = vec!["food".to_string(), long.clone(), "errand".to_string()];
        let kb = tags_menu(&tags);

        assert_eq!(
            kb.rows,
            vec![vec![
                Button::callback("food", "_search_by_tag_all food"),
                Button::callback("errand", "_search_by_tag_all errand"),
            ]]
        );
        assert!(kb
            .rows
            .iter()
            .flatten()
            .filter_map(Button::callback_data)
            .all(|data| data.len() <= CALLBACK_DATA_MAX_BYTES));
        assert!(!has(&kb, &format!("_search_by_tag_all {}", long)));
    }

    #[test]
    fn test_menus_offer_shortcuts_and_finalizer() {
        let compose = compose_menu();
        for data in ["_new url", "_new description", "_new tags", "_new save"] {
            assert!(has(&compose, data), "missing {}", data);
        }
        let edit = edit_menu();
        for data in [
            "_editing title",
            "_editing url",
            "_editing description",
            "_editing tags",
            "_editing update",
        ] {
            assert!(has(&edit, data), "missing {}", data);
        }
        let start = start_menu();
        assert!(has(&start, "_list_all"));
        assert!(has(&start, "_new"));
    }
}
