//! Types that represent the core data model: ledger entries and their kinds.
mod entry;

pub use entry::{format_timestamp, parse_timestamp, Kind, LedgerEntry, TIMESTAMP_FORMAT};
