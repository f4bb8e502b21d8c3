//! SQLite-backed forward store using sqlx.

use {
    async_trait::async_trait,
    crosslink_channels::ChannelRef,
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
    tracing::debug,
};

use crate::{Result, store::ForwardStore, types::ForwardTarget};

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct ChannelRow {
    platform: String,
    channel_id: String,
}

/// SQLite persistence for per-channel target lists.
///
/// Targets are stored as a JSON array in one row per source channel.
pub struct SqliteForwardStore {
    pool: SqlitePool,
}

impl SqliteForwardStore {
    /// Connect with its own pool and run migrations.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;

        crate::run_migrations(&pool).await?;
        debug!(database_url, "forward store ready");

        Ok(Self { pool })
    }

    /// Use an existing pool; call [`crate::run_migrations`] first.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[async_trait]
impl ForwardStore for SqliteForwardStore {
    async fn get_targets(&self, channel: &ChannelRef) -> Result<Option<Vec<ForwardTarget>>> {
        let raw: Option<String> = sqlx::query_scalar(
            "SELECT targets FROM forward_channels WHERE platform = ? AND channel_id = ?",
        )
        .bind(&channel.platform)
        .bind(&channel.channel_id)
        .fetch_optional(&self.pool)
        .await?;
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    async fn upsert_targets(&self, channel: &ChannelRef, targets: &[ForwardTarget]) -> Result<()> {
        let json = serde_json::to_string(targets)?;
        let now = now_secs();
        sqlx::query(
            r#"INSERT INTO forward_channels (platform, channel_id, targets, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(platform, channel_id) DO UPDATE SET
                 targets = excluded.targets,
                 updated_at = excluded.updated_at"#,
        )
        .bind(&channel.platform)
        .bind(&channel.channel_id)
        .bind(&json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelRef>> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            "SELECT platform, channel_id FROM forward_channels
             WHERE targets != '[]' ORDER BY platform, channel_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| ChannelRef::new(r.platform, r.channel_id))
            .collect())
    }
}
