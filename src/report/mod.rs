//! The report engine: aggregates ledger entries for a resolved interval and renders them as a
//! short text summary and as an Excel workbook.
//!
//! Aggregation is lenient about kinds. Entries whose kind is neither income nor expense are kept in
//! the raw listing and get their own per-category group, but they are never added to the income
//! or expense totals.

mod text;
mod workbook;

pub use text::{build_text_summary, NO_RECORDS};
pub use workbook::{
    build_spreadsheet, build_workbook, report_file_name, Cell, Sheet, Workbook, BY_CATEGORY,
    RECORDS, RECORDS_HEADERS, SUMMARY,
};

use crate::model::{Kind, LedgerEntry};
use crate::period::ResolvedInterval;
use crate::store::EntryStore;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The summed amount of one `(kind, category)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    kind: Kind,
    category: String,
    amount: f64,
}

impl CategoryTotal {
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }
}

/// Per-category sums and the overall totals of a set of entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    by_category: Vec<CategoryTotal>,
    income: f64,
    expense: f64,
}

impl Totals {
    /// Groups `entries` by `(kind, category)`. Groups are ordered by the literal kind text and then
    /// by category, so all "expense" groups come before "income" groups.
    pub fn new(entries: &[LedgerEntry]) -> Self {
        let mut groups: BTreeMap<(String, String), (Kind, f64)> = BTreeMap::new();
        let mut income = 0.0;
        let mut expense = 0.0;
        for entry in entries {
            let key = (
                entry.kind().as_str().to_string(),
                entry.category().to_string(),
            );
            groups
                .entry(key)
                .or_insert_with(|| (entry.kind().clone(), 0.0))
                .1 += entry.amount();
            match entry.kind() {
                Kind::Income => income += entry.amount(),
                Kind::Expense => expense += entry.amount(),
                Kind::Other(_) => {}
            }
        }
        let by_category = groups
            .into_iter()
            .map(|((_, category), (kind, amount))| CategoryTotal {
                kind,
                category,
                amount,
            })
            .collect();
        Self {
            by_category,
            income,
            expense,
        }
    }

    pub fn by_category(&self) -> &[CategoryTotal] {
        &self.by_category
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn expense(&self) -> f64 {
        self.expense
    }

    /// Income minus expense.
    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }
}

/// Returns a copy of `entries` ordered by timestamp. Entries with equal timestamps keep their
/// relative order.
pub fn sorted_by_time(entries: &[LedgerEntry]) -> Vec<LedgerEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|entry| entry.created_at());
    sorted
}

/// The outcome of a report request.
#[derive(Debug, Clone, Serialize)]
pub struct ReportResult {
    interval: ResolvedInterval,
    entry_count: usize,
    text_summary: String,
    spreadsheet_path: PathBuf,
}

impl ReportResult {
    pub fn interval(&self) -> &ResolvedInterval {
        &self.interval
    }

    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    pub fn text_summary(&self) -> &str {
        &self.text_summary
    }

    pub fn spreadsheet_path(&self) -> &Path {
        &self.spreadsheet_path
    }
}

/// Fetches the entries of `user_id` that fall in `interval` and produces both the text summary
/// and the workbook, which is written into `out_dir`.
///
/// # Errors
/// - `Database` if the entries cannot be fetched.
/// - `StorageWrite` if the workbook cannot be written.
pub async fn generate_report<S>(
    store: &S,
    user_id: i64,
    interval: &ResolvedInterval,
    out_dir: &Path,
) -> Result<ReportResult>
where
    S: EntryStore + ?Sized,
{
    debug!("Generating report for user {user_id} over {interval}");
    let entries = store
        .fetch_entries(user_id, &interval.start_iso(), &interval.end_iso())
        .await?;
    let text_summary = build_text_summary(&entries);
    let spreadsheet_path = build_spreadsheet(
        &entries,
        out_dir,
        user_id,
        interval.start_date(),
        interval.end_date_inclusive(),
    )?;
    info!(
        "Report for user {user_id} over {interval}: {} entries, written to {}",
        entries.len(),
        spreadsheet_path.display()
    );
    Ok(ReportResult {
        interval: *interval,
        entry_count: entries.len(),
        text_summary,
        spreadsheet_path,
    })
}
