//! The exported Excel report.
//!
//! The workbook is first built as a plain in-memory `Workbook` of named sheets and then written to
//! disk with `rust_xlsxwriter`. Keeping the two steps apart means the layout rules can be checked
//! without reading a file back.

use super::{sorted_by_time, Totals};
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::LedgerEntry;
use crate::{utils, Result};
use anyhow::Context;
use chrono::NaiveDate;
use rust_xlsxwriter::Format;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// The raw entries sheet. It is always present.
pub const RECORDS: &str = "records";
/// The per-category totals sheet.
pub const BY_CATEGORY: &str = "by_category";
/// The income, expense and balance sheet.
pub const SUMMARY: &str = "summary";

/// The columns of the `records` sheet, in order.
pub const RECORDS_HEADERS: [&str; 4] = ["kind", "category", "amount", "created_at"];
const BY_CATEGORY_HEADERS: [&str; 3] = ["kind", "category", "amount"];
const SUMMARY_HEADERS: [&str; 2] = ["metric", "value"];

const INCOME_METRIC: &str = "Income";
const EXPENSE_METRIC: &str = "Expense";
const BALANCE_METRIC: &str = "Balance";

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// A named sheet with a header row and data rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The data rows, not including the header row.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
}

/// An ordered collection of sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Writes the workbook as an `.xlsx` file at `path`, replacing any existing file.
    pub(crate) fn save(&self, path: &Path) -> Res<()> {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let header_format = Format::new().set_bold();
        for sheet in &self.sheets {
            trace!("Writing sheet '{}' with {} rows", sheet.name, sheet.rows.len());
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(sheet.name.as_str())
                .with_context(|| format!("Invalid sheet name '{}'", sheet.name))?;
            for (col, header) in sheet.headers.iter().enumerate() {
                worksheet
                    .write_string_with_format(0, column(col)?, header.as_str(), &header_format)
                    .with_context(|| format!("Unable to write header of sheet '{}'", sheet.name))?;
            }
            for (ix, row) in sheet.rows.iter().enumerate() {
                let row_num = u32::try_from(ix + 1).context("Too many rows for a worksheet")?;
                for (col, cell) in row.iter().enumerate() {
                    let col = column(col)?;
                    let written = match cell {
                        Cell::Text(s) => worksheet.write_string(row_num, col, s.as_str()),
                        Cell::Number(n) => worksheet.write_number(row_num, col, *n),
                    };
                    written.with_context(|| {
                        format!("Unable to write row {row_num} of sheet '{}'", sheet.name)
                    })?;
                }
            }
        }
        workbook
            .save(path)
            .with_context(|| format!("Unable to save workbook to {}", path.display()))
    }
}

fn column(ix: usize) -> Res<u16> {
    u16::try_from(ix).context("Too many columns for a worksheet")
}

/// Lays out the report for `entries`.
///
/// With no entries the workbook has a single `records` sheet holding only the headers. Otherwise
/// it has three sheets: `records` (every entry, oldest first), `by_category` (one row per
/// `(kind, category)` pair) and `summary` (income, expense and balance, in that order).
pub fn build_workbook(entries: &[LedgerEntry]) -> Workbook {
    let mut records = Sheet::new(RECORDS, &RECORDS_HEADERS);
    if entries.is_empty() {
        return Workbook {
            sheets: vec![records],
        };
    }

    for entry in sorted_by_time(entries) {
        records.push(vec![
            entry.kind().as_str().into(),
            entry.category().into(),
            entry.amount().into(),
            entry.timestamp().into(),
        ]);
    }

    let totals = Totals::new(entries);
    let mut by_category = Sheet::new(BY_CATEGORY, &BY_CATEGORY_HEADERS);
    for group in totals.by_category() {
        by_category.push(vec![
            group.kind().as_str().into(),
            group.category().into(),
            group.amount().into(),
        ]);
    }

    let mut summary = Sheet::new(SUMMARY, &SUMMARY_HEADERS);
    summary.push(vec![INCOME_METRIC.into(), totals.income().into()]);
    summary.push(vec![EXPENSE_METRIC.into(), totals.expense().into()]);
    summary.push(vec![BALANCE_METRIC.into(), totals.balance().into()]);

    Workbook {
        sheets: vec![records, by_category, summary],
    }
}

/// The file name of a report, e.g. `report_42_2025-09-01_2025-09-29.xlsx`. The same arguments
/// always produce the same name.
pub fn report_file_name(user_id: i64, start: NaiveDate, end_inclusive: NaiveDate) -> String {
    format!("report_{user_id}_{start}_{end_inclusive}.xlsx")
}

/// Builds the report workbook for `entries` and writes it into `out_dir`, creating the directory
/// if needed. An existing report for the same user and dates is overwritten.
///
/// Returns the path of the written file.
///
/// # Errors
/// Returns a `StorageWrite` error if the directory cannot be created or the file cannot be
/// written.
pub fn build_spreadsheet(
    entries: &[LedgerEntry],
    out_dir: &Path,
    user_id: i64,
    start: NaiveDate,
    end_inclusive: NaiveDate,
) -> Result<PathBuf> {
    utils::make_dir_sync(out_dir).pub_result(ErrorType::StorageWrite)?;
    let path = out_dir.join(report_file_name(user_id, start, end_inclusive));
    let workbook = build_workbook(entries);
    workbook.save(&path).pub_result(ErrorType::StorageWrite)?;
    debug!(
        "Wrote {} sheet(s) for {} entries to {}",
        workbook.sheets().len(),
        entries.len(),
        path.display()
    );
    Ok(path)
}
