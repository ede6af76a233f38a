//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::chat::Conversation;
use crate::db::Db;
use crate::model::LedgerEntry;
use crate::session::MemorySessions;
use crate::store::EntryStore;
use crate::Config;
use tempfile::TempDir;

/// Test environment that sets up a finance home directory with Config and database.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with Config and initialized database.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("finance");
        let config = Config::create(&root, None).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// A conversation over this environment's database with fresh, empty sessions.
    pub fn conversation(&self) -> Conversation<Db, MemorySessions> {
        Conversation::new(
            self.config.db().clone(),
            MemorySessions::new(),
            self.config.exports(),
        )
    }

    /// Inserts `entries` for `user_id` into the database.
    pub async fn insert_entries(&self, user_id: i64, entries: &[LedgerEntry]) {
        for entry in entries {
            self.config.db().add_entry(user_id, entry).await.unwrap();
        }
    }
}
