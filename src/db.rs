use anyhow::{Context, Result};
use sqlx::{any::AnyPoolOptions, Any, Pool};

/// Key/value storage backing the persisted extension state.
#[derive(Clone)]
pub struct Db {
    pub pool: Pool<Any>,
}

impl Db {
    pub async fn new(database_url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        // Every connection to an in-memory SQLite database sees its own copy.
        let in_memory = database_url.contains(":memory:");
        let mut options = AnyPoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to {}", database_url))?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS extension_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_entry(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM extension_storage WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    pub async fn set_entry(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO extension_storage (key, value) VALUES ($1, $2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_entry(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM extension_storage WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
