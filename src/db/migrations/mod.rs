//! Schema migrations for the ledger database.
//!
//! Each schema version `NN` has two SQL files in this directory:
//! - `migration_NN_up.sql` moves the schema from `NN-1` to `NN`
//! - `migration_NN_down.sql` moves it back from `NN` to `NN-1`

use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::{debug, info};

use crate::error::Res;

/// The schema version this build of the program expects.
pub(crate) const CURRENT_VERSION: i32 = 1;

struct Migration {
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

/// Ordered by version.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// One SQL script to apply and the schema version the database is at afterwards.
struct Step {
    sql: &'static str,
    resulting_version: i32,
}

/// Moves the schema from version `from` to version `to`, in either direction.
///
/// The full list of steps is worked out before anything runs, so a gap in the available
/// migrations fails without touching the database. Each step runs in its own transaction together
/// with its `schema_version` update.
pub(crate) async fn run(pool: &SqlitePool, from: i32, to: i32) -> Res<()> {
    if from == to {
        debug!("Schema already at version {to}");
        return Ok(());
    }
    let steps = plan(from, to)?;
    for step in steps {
        debug!("Migrating schema to version {:02}", step.resulting_version);
        apply(pool, step).await?;
    }
    info!("Migrated schema from version {from} to {to}");
    Ok(())
}

fn plan(from: i32, to: i32) -> Res<Vec<Step>> {
    let find = |version: i32| {
        MIGRATIONS
            .iter()
            .find(|m| m.version == version)
            .with_context(|| {
                format!("Migration {version} is missing but required to migrate from {from} to {to}")
            })
    };
    let mut steps = Vec::new();
    if from < to {
        for version in (from + 1)..=to {
            steps.push(Step {
                sql: find(version)?.up_sql,
                resulting_version: version,
            });
        }
    } else {
        for version in ((to + 1)..=from).rev() {
            steps.push(Step {
                sql: find(version)?.down_sql,
                resulting_version: version - 1,
            });
        }
    }
    if steps.is_empty() {
        bail!("No migration steps lead from version {from} to {to}");
    }
    Ok(steps)
}

async fn apply(pool: &SqlitePool, step: Step) -> Res<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin migration transaction")?;

    // multiple statements per script
    tx.execute(step.sql)
        .await
        .with_context(|| format!("Failed to migrate to version {}", step.resulting_version))?;

    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await
        .context("Failed to clear schema_version")?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(step.resulting_version)
        .execute(&mut *tx)
        .await
        .context("Failed to record schema_version")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use tempfile::TempDir;

    /// Creates an empty database whose schema_version is 0.
    async fn create_test_db() -> Res<(TempDir, SqlitePool)> {
        let temp_dir = TempDir::new().context("Failed to create temp dir")?;
        let options = SqliteConnectOptions::new()
            .filename(temp_dir.path().join("test.sqlite"))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to create SQLite database")?;

        sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
            .execute(&pool)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(&pool)
            .await?;
        Ok((temp_dir, pool))
    }

    async fn schema_version(pool: &SqlitePool) -> i32 {
        let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await
            .unwrap();
        row.0
    }

    async fn table_exists(pool: &SqlitePool, table_name: &str) -> bool {
        let row: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table_name)
                .fetch_one(pool)
                .await
                .unwrap();
        row.0 > 0
    }

    #[tokio::test]
    async fn test_migrate_up_and_down() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        assert_eq!(schema_version(&pool).await, 0);

        run(&pool, 0, CURRENT_VERSION).await.unwrap();
        assert_eq!(schema_version(&pool).await, CURRENT_VERSION);
        assert!(table_exists(&pool, "records").await);

        run(&pool, CURRENT_VERSION, 0).await.unwrap();
        assert_eq!(schema_version(&pool).await, 0);
        assert!(!table_exists(&pool, "records").await);
    }

    #[tokio::test]
    async fn test_migrate_to_same_version_is_noop() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        run(&pool, 0, 1).await.unwrap();
        run(&pool, 1, 1).await.unwrap();
        assert_eq!(schema_version(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_records_kind_is_constrained() {
        let (_temp_dir, pool) = create_test_db().await.unwrap();
        run(&pool, 0, 1).await.unwrap();

        let insert = "INSERT INTO records (user_id, kind, category, amount, created_at) \
                      VALUES (?, ?, 'food', 1.5, '2025-09-01T10:00:00')";
        sqlx::query(insert)
            .bind(1_i64)
            .bind("expense")
            .execute(&pool)
            .await
            .unwrap();
        let rejected = sqlx::query(insert)
            .bind(1_i64)
            .bind("refund")
            .execute(&pool)
            .await;
        assert!(rejected.is_err());
    }

    #[test]
    fn test_plan_directions() {
        let up = plan(0, 1).unwrap();
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].resulting_version, 1);
        let down = plan(1, 0).unwrap();
        assert_eq!(down[0].resulting_version, 0);
    }

    #[test]
    fn test_plan_fails_for_missing_migration() {
        assert!(plan(0, 2).is_err());
        assert!(plan(1, 3).is_err());
    }
}
