//! The `KeyCodes` lookup table (§6 persisted state).
//!
//! Grounded on `examples/other_examples/manifests/marmota-alpina-turnkey`,
//! the pack's other hardware-access-control system, which reaches for
//! `sqlx` + `sqlite` for exactly this shape of read-mostly lookup table.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub struct KeyCodeStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyCodeRecord {
    pub is_master_key: bool,
}

impl KeyCodeStore {
    pub async fn connect(path: &std::path::Path) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let pool = SqlitePoolOptions::new().max_connections(4).connect_with(options).await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS KeyCodes (KeyCode TEXT PRIMARY KEY, IsMasterKey BOOLEAN NOT NULL)",
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    /// Look up a key sequence. Per §7, any database error is treated as
    /// "no such code" (an invalid key) — it is logged, not propagated, so
    /// a transient DB hiccup can never crash the alarm path.
    pub async fn lookup(&self, key_sequence: &str) -> Option<KeyCodeRecord> {
        let row = sqlx::query_as::<_, (bool,)>(
            "SELECT IsMasterKey FROM KeyCodes WHERE KeyCode = ?1",
        )
        .bind(key_sequence)
        .fetch_optional(&self.pool)
        .await;

        match row {
            Ok(Some((is_master_key,))) => Some(KeyCodeRecord { is_master_key }),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(err = %e, "key-code lookup failed, treating as invalid code");
                None
            }
        }
    }

    #[cfg(test)]
    pub async fn insert(&self, key_sequence: &str, is_master_key: bool) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO KeyCodes (KeyCode, IsMasterKey) VALUES (?1, ?2)")
            .bind(key_sequence)
            .bind(is_master_key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
