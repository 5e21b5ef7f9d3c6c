//! User repository implementation.

use sqlx::{Pool, Postgres, Row};
use tracing::info;

use notebot_core::{Error, Result, User};

/// PostgreSQL repository for chat users.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Find a user by chat platform identifier.
    pub async fn get_by_external_id(&self, external_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, tg_chat_id, tg_username FROM users WHERE tg_chat_id = $1 LIMIT 1",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| User {
            id: row.get("id"),
            external_id: row.get("tg_chat_id"),
            name: row.get("tg_username"),
        }))
    }

    /// Insert a user and return the generated identifier.
    ///
    /// A concurrent registration of the same external id resolves to the
    /// existing row instead of failing on the unique index.
    pub async fn create(&self, external_id: i64, name: Option<&str>) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (tg_chat_id, tg_username) VALUES ($1, $2)
            ON CONFLICT (tg_chat_id) DO UPDATE SET tg_chat_id = EXCLUDED.tg_chat_id
            RETURNING id
            "#,
        )
        .bind(external_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "users",
            op = "create",
            user_id = id,
            chat_id = external_id,
            "Registered user"
        );
        Ok(id)
    }
}
