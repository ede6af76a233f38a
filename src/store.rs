//! The storage seam of the report engine.

use crate::model::LedgerEntry;
use crate::Result;

/// Persists ledger entries and reads them back by time range.
///
/// Implementations must be safe to use from several report requests at once. Any serialization
/// of writes is the implementation's concern.
#[async_trait::async_trait]
pub trait EntryStore: Send + Sync {
    /// Appends `entry` for `user_id`. Entries are never updated or deleted.
    async fn add_entry(&self, user_id: i64, entry: &LedgerEntry) -> Result<()>;

    /// Returns the entries of `user_id` with `start_iso <= timestamp < end_iso`, oldest first.
    /// Both bounds are ISO-8601 datetime strings and are compared lexicographically.
    async fn fetch_entries(
        &self,
        user_id: i64,
        start_iso: &str,
        end_iso: &str,
    ) -> Result<Vec<LedgerEntry>>;
}
