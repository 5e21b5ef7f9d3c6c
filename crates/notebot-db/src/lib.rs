//! # notebot-db
//!
//! PostgreSQL storage for notebot.
//!
//! This crate provides:
//! - Connection pool management
//! - Repositories for users, notes, and tags
//! - Transactional note writes with tag diffing under a write deadline
//! - An in-memory [`NoteStore`] for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use notebot_db::{CreateNoteRequest, Database, NoteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/notebot").await?;
//!     db.migrate().await?;
//!
//!     let user_id = db.ensure_user(42, Some("ann")).await?;
//!     let note_id = db.create_note_with_tags(CreateNoteRequest {
//!         user_id,
//!         title: "Groceries".to_string(),
//!         tags: vec!["food".to_string()],
//!         ..Default::default()
//!     }).await?;
//!
//!     println!("Created note: {}", note_id);
//!     Ok(())
//! }
//! ```
pub mod memory;
pub mod notes;
pub mod pool;
pub mod tags;
pub mod users;

// Always compiled so integration tests (in tests/) can share the setup helpers.
pub mod test_fixtures;

pub use notebot_core::*;

pub use memory::MemoryNoteStore;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use tags::PgTagRepository;
pub use users::PgUserRepository;

use async_trait::async_trait;

/// Database handle bundling every repository over one pool.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Chat user registry.
    pub users: PgUserRepository,
    /// Note repository.
    pub notes: PgNoteRepository,
    /// Tag repository.
    pub tags: PgTagRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[async_trait]
impl NoteStore for Database {
    async fn get_user_by_external_id(&self, external_id: i64) -> Result<Option<User>> {
        self.users.get_by_external_id(external_id).await
    }

    async fn create_user(&self, external_id: i64, name: Option<&str>) -> Result<i64> {
        self.users.create(external_id, name).await
    }

    async fn get_note(&self, id: i64) -> Result<Option<Note>> {
        self.notes.fetch(id).await
    }

    async fn get_notes_by_user(&self, user_id: i64) -> Result<Vec<Note>> {
        self.notes.list_by_user(user_id).await
    }

    async fn get_notes_by_user_and_tag(&self, user_id: i64, tag: &str) -> Result<Vec<Note>> {
        self.notes.list_by_user_and_tag(user_id, tag).await
    }

    async fn get_tags_by_note(&self, note_id: i64) -> Result<Vec<Tag>> {
        self.tags.for_note(note_id).await
    }

    async fn get_tags_by_user(&self, user_id: i64) -> Result<Vec<Tag>> {
        self.tags.for_user(user_id).await
    }

    async fn create_note_with_tags(&self, req: CreateNoteRequest) -> Result<i64> {
        self.notes.insert_with_tags(req).await
    }

    async fn update_note_with_tag_diff(&self, note: &Note, new_tags: &[String]) -> Result<()> {
        self.notes.update_with_tag_diff(note, new_tags).await
    }

    async fn delete_note(&self, id: i64) -> Result<()> {
        self.notes.delete(id).await
    }
}
