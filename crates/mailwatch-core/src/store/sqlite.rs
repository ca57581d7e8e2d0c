//! SQLite state store.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::StateStore;
use crate::error::Result;
use crate::event::EventPayload;
use crate::state::CheckState;

/// Stores the state of one agent, and its emitted events, in SQLite.
///
/// Several agents can share a database; rows are keyed by agent name.
pub struct SqliteStore {
    pool: SqlitePool,
    agent: String,
}

impl SqliteStore {
    /// Opens (or creates) the database at `database_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str, agent: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self {
            pool,
            agent: agent.to_string(),
        };
        store.initialize().await?;
        Ok(store)
    }

    /// Creates an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory(agent: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self {
            pool,
            agent: agent.to_string(),
        };
        store.initialize().await?;
        Ok(store)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS check_state (
                agent TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent TEXT NOT NULL,
                folder TEXT NOT NULL,
                message_id TEXT,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_agent ON events(agent, id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Agent this store belongs to.
    #[must_use]
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Events recorded for this agent, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored payload is corrupt.
    pub async fn events(&self) -> Result<Vec<EventPayload>> {
        let rows = sqlx::query("SELECT payload FROM events WHERE agent = ? ORDER BY id")
            .bind(&self.agent)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let payload: String = row.get("payload");
                Ok(serde_json::from_str(&payload)?)
            })
            .collect()
    }
}

impl StateStore for SqliteStore {
    async fn load(&mut self) -> Result<CheckState> {
        let row = sqlx::query("SELECT state FROM check_state WHERE agent = ?")
            .bind(&self.agent)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let state: String = row.get("state");
                CheckState::from_json(&state)
            }
            None => Ok(CheckState::default()),
        }
    }

    async fn commit(&mut self, state: &CheckState, event: Option<&EventPayload>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let state_json = state.to_json()?;
        let payload = event.map(serde_json::to_string).transpose()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO check_state (agent, state, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(agent) DO UPDATE SET
                state = excluded.state,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&self.agent)
        .bind(&state_json)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        if let (Some(event), Some(payload)) = (event, &payload) {
            sqlx::query(
                r"
                INSERT INTO events (agent, folder, message_id, payload, created_at)
                VALUES (?, ?, ?, ?, ?)
                ",
            )
            .bind(&self.agent)
            .bind(&event.folder)
            .bind(&event.message_id)
            .bind(payload)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
            debug!("Stored event for {:?} in {}", event.message_id, event.folder);
        }

        tx.commit().await?;
        Ok(())
    }
}
