//! In-memory note store for deterministic testing.
//!
//! Mirrors the PostgreSQL semantics the bot relies on: per-user unique tags,
//! unique note-tag links, cascade of links on note delete, owner-scoped
//! updates, and all-or-nothing writes.
//!
//! ## Usage
//!
//! ```rust
//! use notebot_core::{CreateNoteRequest, NoteStore};
//! use notebot_db::MemoryNoteStore;
//!
//! # async fn demo() -> notebot_core::Result<()> {
//! let store = MemoryNoteStore::new();
//! let user_id = store.ensure_user(1001, Some("ann")).await?;
//! let note_id = store
//!     .create_note_with_tags(CreateNoteRequest {
//!         user_id,
//!         title: "Groceries".to_string(),
//!         tags: vec!["food".to_string()],
//!         ..Default::default()
//!     })
//!     .await?;
//! assert_eq!(store.get_tags_by_note(note_id).await?.len(), 1);
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use notebot_core::{
    normalize_tags, CreateNoteRequest, Error, Note, NoteStore, Result, Tag, TagDiff, User,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    notes: Vec<Note>,
    tags: Vec<Tag>,
    /// (note_id, tag_id) in insertion order.
    links: Vec<(i64, i64)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn find_or_create_tag(&mut self, user_id: i64, title: &str) -> i64 {
        if let Some(tag) = self
            .tags
            .iter()
            .find(|t| t.user_id == user_id && t.title == title)
        {
            return tag.id;
        }
        let id = self.next_id();
        self.tags.push(Tag {
            id,
            user_id,
            title: title.to_string(),
        });
        id
    }

    fn link(&mut self, note_id: i64, tag_id: i64) {
        if !self.links.contains(&(note_id, tag_id)) {
            self.links.push((note_id, tag_id));
        }
    }

    fn tags_for_note(&self, note_id: i64) -> Vec<Tag> {
        self.links
            .iter()
            .filter(|(n, _)| *n == note_id)
            .filter_map(|(_, t)| self.tags.iter().find(|tag| tag.id == *t).cloned())
            .collect()
    }
}

/// Note store kept entirely in process memory.
#[derive(Clone, Default)]
pub struct MemoryNoteStore {
    tables: Arc<Mutex<Tables>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryNoteStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a database-style error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored notes across all users.
    pub fn note_count(&self) -> usize {
        self.lock().notes.len()
    }

    /// Number of note-tag links across all notes.
    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A poisoned lock only means a test panicked mid-write.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal("simulated write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn get_user_by_external_id(&self, external_id: i64) -> Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn create_user(&self, external_id: i64, name: Option<&str>) -> Result<i64> {
        self.check_writable()?;
        let mut tables = self.lock();
        if let Some(user) = tables.users.iter().find(|u| u.external_id == external_id) {
            return Ok(user.id);
        }
        let id = tables.next_id();
        tables.users.push(User {
            id,
            external_id,
            name: name.map(str::to_string),
        });
        Ok(id)
    }

    async fn get_note(&self, id: i64) -> Result<Option<Note>> {
        Ok(self.lock().notes.iter().find(|n| n.id == id).cloned())
    }

    async fn get_notes_by_user(&self, user_id: i64) -> Result<Vec<Note>> {
        Ok(self
            .lock()
            .notes
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_notes_by_user_and_tag(&self, user_id: i64, tag: &str) -> Result<Vec<Note>> {
        let tables = self.lock();
        Ok(tables
            .notes
            .iter()
            .filter(|n| n.user_id == user_id)
            .filter(|n| {
                tables
                    .tags_for_note(n.id)
                    .iter()
                    .any(|t| t.title == tag && t.user_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn get_tags_by_note(&self, note_id: i64) -> Result<Vec<Tag>> {
        Ok(self.lock().tags_for_note(note_id))
    }

    async fn get_tags_by_user(&self, user_id: i64) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = self
            .lock()
            .tags
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(tags)
    }

    async fn create_note_with_tags(&self, req: CreateNoteRequest) -> Result<i64> {
        self.check_writable()?;
        let mut tables = self.lock();
        let tag_ids: Vec<i64> = normalize_tags(&req.tags)
            .iter()
            .map(|title| tables.find_or_create_tag(req.user_id, title))
            .collect();
        let id = tables.next_id();
        tables.notes.push(Note {
            id,
            user_id: req.user_id,
            title: req.title,
            url: req.url,
            description: req.description,
        });
        for tag_id in tag_ids {
            tables.link(id, tag_id);
        }
        Ok(id)
    }

    async fn update_note_with_tag_diff(&self, note: &Note, new_tags: &[String]) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.lock();
        let slot = tables
            .notes
            .iter_mut()
            .find(|n| n.id == note.id && n.user_id == note.user_id)
            .ok_or(Error::NoteNotFound(note.id))?;
        *slot = note.clone();

        let diff = TagDiff::compute(&tables.tags_for_note(note.id), new_tags);
        tables
            .links
            .retain(|(n, t)| *n != note.id || !diff.unlink.iter().any(|tag| tag.id == *t));
        for title in &diff.link {
            let tag_id = tables.find_or_create_tag(note.user_id, title);
            tables.link(note.id, tag_id);
        }
        Ok(())
    }

    async fn delete_note(&self, id: i64) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.lock();
        let before = tables.notes.len();
        tables.notes.retain(|n| n.id != id);
        if tables.notes.len() == before {
            return Err(Error::NoteNotFound(id));
        }
        tables.links.retain(|(n, _)| *n != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn seeded() -> (MemoryNoteStore, i64, i64) {
        let store = MemoryNoteStore::new();
        let user_id = store.ensure_user(1001, Some("ann")).await.unwrap();
        let note_id = store
            .create_note_with_tags(CreateNoteRequest {
                user_id,
                title: "Groceries".to_string(),
                tags: strings(&["food", "errand"]),
                ..Default::default()
            })
            .await
            .unwrap();
        (store, user_id, note_id)
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let store = MemoryNoteStore::new();
        let a = store.ensure_user(5, None).await.unwrap();
        let b = store.ensure_user(5, Some("later")).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_tags_are_per_user() {
        let (store, _, _) = seeded().await;
        let other = store.ensure_user(2002, None).await.unwrap();
        store
            .create_note_with_tags(CreateNoteRequest {
                user_id: other,
                title: "Other".to_string(),
                tags: strings(&["food"]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(store.get_tags_by_user(other).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_with_same_tags_keeps_links() {
        let (store, user_id, note_id) = seeded().await;
        let note = store.get_note(note_id).await.unwrap().unwrap();
        store
            .update_note_with_tag_diff(&note, &strings(&["errand", "food"]))
            .await
            .unwrap();
        assert_eq!(store.link_count(), 2);
        assert_eq!(store.get_tags_by_user(user_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_rejects_foreign_owner() {
        let (store, _, note_id) = seeded().await;
        let mut note = store.get_note(note_id).await.unwrap().unwrap();
        note.user_id += 100;
        let err = store.update_note_with_tag_diff(&note, &[]).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_cascades_links_but_keeps_tags() {
        let (store, user_id, note_id) = seeded().await;
        store.delete_note(note_id).await.unwrap();
        assert_eq!(store.link_count(), 0);
        assert_eq!(store.get_tags_by_user(user_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_untouched() {
        let (store, user_id, _) = seeded().await;
        store.set_fail_writes(true);
        let result = store
            .create_note_with_tags(CreateNoteRequest {
                user_id,
                title: "Nope".to_string(),
                ..Default::default()
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.note_count(), 1);
    }
}
