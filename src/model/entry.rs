use crate::error::Res;
use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The text form of timestamps as they are stored and exported, e.g. `2025-09-01T12:30:00.125`.
/// Fractional seconds are only written when present. Values in this format sort lexicographically
/// in the same order as the instants they represent.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const INCOME_STR: &str = "income";
const EXPENSE_STR: &str = "expense";

/// Whether an entry is money coming in or going out.
///
/// Entries read back from storage can, in principle, carry some other value. These are kept as
/// `Other` with the literal text so that they still show up in listings, but they never count
/// toward the income or expense totals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Income,
    Expense,
    Other(String),
}

impl Kind {
    /// The literal text of the kind. Groupings sort on this, so "expense" comes before "income".
    pub fn as_str(&self) -> &str {
        match self {
            Kind::Income => INCOME_STR,
            Kind::Expense => EXPENSE_STR,
            Kind::Other(s) => s.as_str(),
        }
    }

    /// Maps any text to a `Kind` without failing. Used when reading rows back from storage.
    pub fn lenient(s: impl AsRef<str>) -> Self {
        match s.as_ref() {
            INCOME_STR => Kind::Income,
            EXPENSE_STR => Kind::Expense,
            other => Kind::Other(other.to_string()),
        }
    }

    pub fn is_expense(&self) -> bool {
        matches!(self, Kind::Expense)
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parsing: only `income` and `expense` are accepted.
impl FromStr for Kind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Kind::lenient(s.trim().to_lowercase()) {
            Kind::Other(other) => bail!("Unknown kind '{other}', expected 'income' or 'expense'"),
            known => Ok(known),
        }
    }
}

impl Serialize for Kind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Kind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Kind::lenient(s))
    }
}

/// A single recorded income or expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerEntry {
    kind: Kind,
    category: String,
    amount: f64,
    created_at: NaiveDateTime,
}

impl LedgerEntry {
    /// Creates an entry. Surrounding whitespace is removed from `category`.
    pub fn new(
        kind: Kind,
        category: impl AsRef<str>,
        amount: f64,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            kind,
            category: category.as_ref().trim().to_string(),
            amount,
            created_at,
        }
    }

    /// Builds an entry from the raw column values of a storage row.
    pub(crate) fn from_row(kind: &str, category: &str, amount: f64, created_at: &str) -> Res<Self> {
        let created_at = parse_timestamp(created_at)?;
        Ok(Self::new(Kind::lenient(kind), category, amount, created_at))
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    /// The `created_at` timestamp in its stored ISO-8601 text form.
    pub fn timestamp(&self) -> String {
        format_timestamp(self.created_at)
    }
}

pub fn format_timestamp(dt: NaiveDateTime) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Other local date-time forms accepted when reading, tried after `TIMESTAMP_FORMAT`.
const LENIENT_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parses an ISO-8601 timestamp. Besides `TIMESTAMP_FORMAT` this accepts values without seconds,
/// a space instead of the `T`, a trailing UTC offset (the wall-clock time is kept and the offset
/// dropped) and bare dates (read as midnight).
pub fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Ok(dt);
    }
    if let Some(dt) = LENIENT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .with_context(|| format!("Unable to parse '{s}' as an ISO-8601 timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(Kind::from_str("income").unwrap(), Kind::Income);
        assert_eq!(Kind::from_str(" Expense ").unwrap(), Kind::Expense);
        assert!(Kind::from_str("refund").is_err());
        assert_eq!(Kind::lenient("refund"), Kind::Other("refund".to_string()));
        assert_eq!(Kind::lenient("refund").as_str(), "refund");
    }

    #[test]
    fn test_entry_trims_category() {
        let entry = LedgerEntry::new(Kind::Expense, "  Food ", 12.5, at(2025, 9, 1, 8));
        assert_eq!(entry.category(), "Food");
        assert_eq!(entry.timestamp(), "2025-09-01T08:00:00");
    }

    #[test]
    fn test_timestamp_with_fraction() {
        let dt = parse_timestamp("2025-09-01T12:30:00.125").unwrap();
        assert_eq!(format_timestamp(dt), "2025-09-01T12:30:00.125");
        let dt = parse_timestamp("2025-09-01T12:30:00").unwrap();
        assert_eq!(dt, at(2025, 9, 1, 12) + chrono::Duration::minutes(30));
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_timestamp_other_iso_forms() {
        let half_past = at(2025, 9, 5, 12) + chrono::Duration::minutes(30);
        for text in [
            "2025-09-05T12:30",
            "2025-09-05 12:30:00",
            "2025-09-05 12:30",
            "2025-09-05T12:30:00+00:00",
            "2025-09-05T12:30:00+03:00",
            "2025-09-05T12:30:00Z",
        ] {
            assert_eq!(parse_timestamp(text).unwrap(), half_past, "{text}");
        }
        assert_eq!(parse_timestamp("2025-09-05").unwrap(), at(2025, 9, 5, 0));
        assert!(parse_timestamp("2025-09-05T25:00").is_err());
    }

    #[test]
    fn test_from_row_keeps_unknown_kind() {
        let entry = LedgerEntry::from_row("gift", "misc", 5.0, "2025-01-02T03:04:05").unwrap();
        assert_eq!(entry.kind(), &Kind::Other("gift".to_string()));
        assert!(!entry.kind().is_expense());
    }

    #[test]
    fn test_entry_json() {
        let entry = LedgerEntry::new(Kind::Income, "salary", 1000.0, at(2025, 9, 1, 0));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""kind":"income""#), "{json}");
        let back: LedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
