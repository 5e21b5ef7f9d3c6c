//! Tag repository implementation.
//!
//! Tags are unique per `(user_id, title)`. The transactional helpers are used
//! by the note repository so that tag creation and linking commit together
//! with the note row.

use sqlx::{postgres::PgRow, Pool, Postgres, Row, Transaction};

use notebot_core::{Error, Result, Tag};

/// PostgreSQL repository for per-user tags and note links.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

fn tag_from_row(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
    }
}

const TAGS_FOR_NOTE_SQL: &str = r#"
    SELECT t.id, t.user_id, t.title
    FROM tags t
    JOIN tags_to_note ttn ON t.id = ttn.tag_id
    WHERE ttn.note_id = $1
    ORDER BY ttn.id
"#;

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Tags linked to a note, in link order.
    pub async fn for_note(&self, note_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(TAGS_FOR_NOTE_SQL)
            .bind(note_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Every tag the user has created, ordered by title.
    pub async fn for_user(&self, user_id: i64) -> Result<Vec<Tag>> {
        let rows =
            sqlx::query("SELECT id, user_id, title FROM tags WHERE user_id = $1 ORDER BY title")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Tags linked to a note, read inside a transaction.
    pub async fn for_note_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: i64,
    ) -> Result<Vec<Tag>> {
        let rows = sqlx::query(TAGS_FOR_NOTE_SQL)
            .bind(note_id)
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(tag_from_row).collect())
    }

    /// Return the id of the user's tag with this title, creating it if needed.
    pub async fn find_or_create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        title: &str,
    ) -> Result<i64> {
        sqlx::query_scalar(
            r#"
            INSERT INTO tags (user_id, title) VALUES ($1, $2)
            ON CONFLICT (user_id, title) DO UPDATE SET title = EXCLUDED.title
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(title)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)
    }

    /// Link a tag to a note. Linking twice is a no-op.
    pub async fn link_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: i64,
        tag_id: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO tags_to_note (note_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(note_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Remove a tag link. The tag row itself is kept.
    pub async fn unlink_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: i64,
        tag_id: i64,
    ) -> Result<()> {
        sqlx::query("DELETE FROM tags_to_note WHERE tag_id = $1 AND note_id = $2")
            .bind(tag_id)
            .bind(note_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
