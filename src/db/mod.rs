//! This module is responsible for reading and writing the SQLite ledger database.

mod migrations;

use crate::error::{Error, ErrorType, IntoResult, Res};
use crate::model::{Kind, LedgerEntry};
use crate::store::EntryStore;
use crate::Result;
use anyhow::{anyhow, bail, Context};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, trace};

const MAX_CONNECTIONS: u32 = 5;

/// A handle to the SQLite database. Cloning is cheap and clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the schema to the current version
    pub(crate) async fn init(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at {}", path.display());
        }
        let pool = connect(path, true).await?;
        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await
            .context("Failed to create schema_version table")?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await
            .context("Failed to initialize schema_version")?;
        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        debug!("Initialized database at {}", path.display());
        Ok(Self { pool })
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Opens a connection pool
    /// - Migrates the schema if it is older than the current version
    pub(crate) async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        let db = Self { pool };
        let version = db.schema_version().await?;
        if version > migrations::CURRENT_VERSION {
            bail!(
                "The database schema version {version} is newer than this program supports ({}). \
                Is a newer version of fintrack available?",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&db.pool, version, migrations::CURRENT_VERSION).await?;
        Ok(db)
    }

    async fn schema_version(&self) -> Res<i32> {
        let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read schema_version")?;
        Ok(row.0)
    }

    /// Inserts one row and returns its id.
    pub(crate) async fn insert_entry(&self, user_id: i64, entry: &LedgerEntry) -> Res<i64> {
        trace!("Inserting {entry:?} for user {user_id}");
        let result = sqlx::query(
            "INSERT INTO records (user_id, kind, category, amount, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(entry.kind().as_str())
        .bind(entry.category())
        .bind(entry.amount())
        .bind(entry.timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to insert record")?;
        Ok(result.last_insert_rowid())
    }

    /// Selects rows of `user_id` with `start_iso <= created_at < end_iso`, oldest first.
    pub(crate) async fn select_entries(
        &self,
        user_id: i64,
        start_iso: &str,
        end_iso: &str,
    ) -> Res<Vec<LedgerEntry>> {
        let rows: Vec<(String, String, f64, String)> = sqlx::query_as(
            "SELECT kind, category, amount, created_at FROM records \
             WHERE user_id = ? AND created_at >= ? AND created_at < ? \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .bind(start_iso)
        .bind(end_iso)
        .fetch_all(&self.pool)
        .await
        .context("Failed to select records")?;
        debug!(
            "Selected {} records for user {user_id} in [{start_iso}, {end_iso})",
            rows.len()
        );
        rows.iter()
            .map(|(kind, category, amount, created_at)| {
                LedgerEntry::from_row(kind, category, *amount, created_at)
            })
            .collect()
    }
}

async fn connect(path: &Path, create: bool) -> Res<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create);
    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at {}", path.display()))
}

#[async_trait::async_trait]
impl EntryStore for Db {
    async fn add_entry(&self, user_id: i64, entry: &LedgerEntry) -> Result<()> {
        if let Kind::Other(kind) = entry.kind() {
            return Err(Error::new(
                ErrorType::Input,
                anyhow!("Entries must be income or expense, not '{kind}'"),
            ));
        }
        if entry.category().is_empty() {
            return Err(Error::new(
                ErrorType::Input,
                anyhow!("The category of an entry cannot be empty"),
            ));
        }
        self.insert_entry(user_id, entry)
            .await
            .pub_result(ErrorType::Database)?;
        Ok(())
    }

    async fn fetch_entries(
        &self,
        user_id: i64,
        start_iso: &str,
        end_iso: &str,
    ) -> Result<Vec<LedgerEntry>> {
        self.select_entries(user_id, start_iso, end_iso)
            .await
            .pub_result(ErrorType::Database)
    }
}
