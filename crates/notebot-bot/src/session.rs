//! Per-user conversation sessions.
//!
//! Sessions live in process memory and are lost on restart; a user then
//! simply resumes from the idle status. Handlers read a session once when an
//! event arrives and write it back once when they are done. The store lock is
//! held only for the map access itself, never across network calls, so two
//! overlapping events for the same user resolve as last-writer-wins.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use notebot_core::Draft;

use crate::state::Status;

/// Conversation state of one chat user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Internal user id, resolved on first contact.
    pub user_id: Option<i64>,
    pub status: Status,
    pub draft: Draft,
    /// Zero-based page of the current note list.
    pub page: usize,
    /// Tag of the active tag-filtered list.
    pub tag: Option<String>,
}

impl Session {
    /// Enter a list context at its first page.
    pub fn enter_list(&mut self, tag: Option<String>) {
        self.page = 0;
        self.tag = tag;
    }
}

/// Keyed session storage.
pub trait SessionStore: Send + Sync {
    /// The stored session, or a default one when the key is unknown.
    ///
    /// Never inserts.
    fn get(&self, key: i64) -> Session;

    /// Overwrite the session for `key`.
    fn set(&self, key: i64, session: Session);
}

/// Session map behind a single mutex.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<i64, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a stored session.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, Session>> {
        // Sessions are plain values; a panic mid-write cannot leave one half-built.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: i64) -> Session {
        self.lock().get(&key).cloned().unwrap_or_default()
    }

    fn set(&self, key: i64, session: Session) {
        self.lock().insert(key, session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_get_unknown_returns_default_without_inserting() {
        let store = MemorySessionStore::new();
        assert_eq!(store.get(1), Session::default());
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let store = MemorySessionStore::new();
        store.set(
            1,
            Session {
                status: Status::NewUrl,
                ..Default::default()
            },
        );
        store.set(
            1,
            Session {
                page: 2,
                ..Default::default()
            },
        );
        let session = store.get(1);
        assert_eq!(session.status, Status::None);
        assert_eq!(session.page, 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_enter_list_resets_page() {
        let mut session = Session {
            page: 4,
            ..Default::default()
        };
        session.enter_list(Some("food".to_string()));
        assert_eq!(session.page, 0);
        assert_eq!(session.tag.as_deref(), Some("food"));
    }

    #[test]
    fn test_concurrent_users_do_not_interfere() {
        let store = Arc::new(MemorySessionStore::new());
        let handles: Vec<_> = (0..8)
            .map(|key| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for page in 0..100 {
                        let mut session = store.get(key);
                        session.page = page;
                        store.set(key, session);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 8);
        for key in 0..8 {
            assert_eq!(store.get(key).page, 99);
        }
    }
}
