use super::Totals;
use crate::model::{Kind, LedgerEntry};

/// The summary returned when there is nothing to report.
pub const NO_RECORDS: &str = "No records found for the selected period.";

const HEADER: &str = "📊 *Report by category:*";
const INCOME_MARKER: &str = "➕";
const EXPENSE_MARKER: &str = "➖";
const INCOME_TOTAL_MARKER: &str = "💰";
const EXPENSE_TOTAL_MARKER: &str = "💸";
const BALANCE_OK_MARKER: &str = "✅";
const BALANCE_NEGATIVE_MARKER: &str = "⚠️";

/// Renders the chat summary of `entries`: one line per `(kind, category)` group followed by the
/// income and expense totals and the balance. Amounts are always shown with two decimals.
pub fn build_text_summary(entries: &[LedgerEntry]) -> String {
    if entries.is_empty() {
        return NO_RECORDS.to_string();
    }
    let totals = Totals::new(entries);

    let mut lines = vec![HEADER.to_string()];
    for group in totals.by_category() {
        let marker = match group.kind() {
            Kind::Income => INCOME_MARKER,
            _ => EXPENSE_MARKER,
        };
        lines.push(format!(
            "{marker} {}: {} — {:.2}",
            group.kind(),
            group.category(),
            group.amount()
        ));
    }
    lines.push(String::new());
    lines.push(format!("{INCOME_TOTAL_MARKER} Income: *{:.2}*", totals.income()));
    lines.push(format!(
        "{EXPENSE_TOTAL_MARKER} Expense: *{:.2}*",
        totals.expense()
    ));
    let balance = totals.balance();
    let balance_marker = if balance >= 0.0 {
        BALANCE_OK_MARKER
    } else {
        BALANCE_NEGATIVE_MARKER
    };
    lines.push(format!("{balance_marker} Balance: *{balance:.2}*"));
    lines.join("\n")
}
