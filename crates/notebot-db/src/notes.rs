//! Note repository implementation.
//!
//! Inserts and updates run inside a single transaction together with all
//! tag creation and linking, under a write deadline. When the deadline
//! expires the transaction future is dropped, which rolls it back.

use std::future::Future;
use std::time::{Duration, Instant};

use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::{debug, info, warn};

use notebot_core::{defaults, normalize_tags, CreateNoteRequest, Error, Note, Result, TagDiff};

use crate::tags::PgTagRepository;

/// PostgreSQL repository for notes.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
    tags: PgTagRepository,
    write_timeout: Duration,
}

fn note_from_row(row: &PgRow) -> Note {
    Note {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        url: row.get("url"),
        description: row.get("description"),
    }
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            tags: PgTagRepository::new(pool.clone()),
            pool,
            write_timeout: defaults::STORE_WRITE_TIMEOUT,
        }
    }

    /// Override the deadline applied to each write.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    async fn with_deadline<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        match tokio::time::timeout(self.write_timeout, fut).await {
            Ok(result) => {
                debug!(
                    subsystem = "db",
                    component = "notes",
                    op,
                    duration_ms = start.elapsed().as_millis() as u64,
                    success = result.is_ok(),
                    "Write finished"
                );
                result
            }
            Err(_) => {
                warn!(
                    subsystem = "db",
                    component = "notes",
                    op,
                    timeout_secs = self.write_timeout.as_secs(),
                    "Write deadline exceeded, transaction rolled back"
                );
                Err(Error::Timeout(format!(
                    "{} exceeded {}s",
                    op,
                    self.write_timeout.as_secs()
                )))
            }
        }
    }

    /// Fetch a single note.
    pub async fn fetch(&self, id: i64) -> Result<Option<Note>> {
        let row = sqlx::query(
            "SELECT id, user_id, title, url, description FROM notes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.as_ref().map(note_from_row))
    }

    /// All notes of a user, oldest first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, url, description FROM notes WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(note_from_row).collect())
    }

    /// Notes of a user carrying the given tag title, oldest first.
    pub async fn list_by_user_and_tag(&self, user_id: i64, tag: &str) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.user_id, n.title, n.url, n.description
            FROM notes n
            JOIN tags_to_note ttn ON ttn.note_id = n.id
            JOIN tags t ON t.id = ttn.tag_id AND t.user_id = n.user_id
            WHERE n.user_id = $1 AND t.title = $2
            ORDER BY n.id
            "#,
        )
        .bind(user_id)
        .bind(tag)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(note_from_row).collect())
    }

    /// Insert a note and link its tags in one transaction.
    pub async fn insert_with_tags(&self, req: CreateNoteRequest) -> Result<i64> {
        self.with_deadline("create_note", self.insert_with_tags_inner(req))
            .await
    }

    async fn insert_with_tags_inner(&self, req: CreateNoteRequest) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let tags = normalize_tags(&req.tags);
        let mut tag_ids = Vec::with_capacity(tags.len());
        for title in &tags {
            tag_ids.push(self.tags.find_or_create_tx(&mut tx, req.user_id, title).await?);
        }

        let note_id: i64 = sqlx::query_scalar(
            "INSERT INTO notes (user_id, title, url, description) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(req.user_id)
        .bind(&req.title)
        .bind(&req.url)
        .bind(&req.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        for tag_id in tag_ids {
            self.tags.link_tx(&mut tx, note_id, tag_id).await?;
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "notes",
            op = "create_note",
            user_id = req.user_id,
            note_id,
            tag_count = tags.len(),
            "Note created"
        );
        Ok(note_id)
    }

    /// Overwrite the note's scalar fields and apply the tag-set diff.
    pub async fn update_with_tag_diff(&self, note: &Note, new_tags: &[String]) -> Result<()> {
        self.with_deadline("update_note", self.update_with_tag_diff_inner(note, new_tags))
            .await
    }

    async fn update_with_tag_diff_inner(&self, note: &Note, new_tags: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let updated = sqlx::query(
            "UPDATE notes SET title = $1, url = $2, description = $3 WHERE id = $4 AND user_id = $5",
        )
        .bind(&note.title)
        .bind(&note.url)
        .bind(&note.description)
        .bind(note.id)
        .bind(note.user_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if updated == 0 {
            return Err(Error::NoteNotFound(note.id));
        }

        let stored = self.tags.for_note_tx(&mut tx, note.id).await?;
        let diff = TagDiff::compute(&stored, new_tags);

        for tag in &diff.unlink {
            self.tags.unlink_tx(&mut tx, note.id, tag.id).await?;
        }
        for title in &diff.link {
            let tag_id = self.tags.find_or_create_tx(&mut tx, note.user_id, title).await?;
            self.tags.link_tx(&mut tx, note.id, tag_id).await?;
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "notes",
            op = "update_note",
            user_id = note.user_id,
            note_id = note.id,
            linked = diff.link.len(),
            unlinked = diff.unlink.len(),
            "Note updated"
        );
        Ok(())
    }

    /// Delete a note; links cascade.
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.with_deadline("delete_note", async {
            let deleted = sqlx::query("DELETE FROM notes WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?
                .rows_affected();
            if deleted == 0 {
                return Err(Error::NoteNotFound(id));
            }
            debug!(subsystem = "db", component = "notes", note_id = id, "Note deleted");
            Ok(())
        })
        .await
    }
}
