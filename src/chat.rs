//! The conversation front-end: turns user messages and menu selections into ledger writes and
//! reports. It knows nothing about any particular messenger. A transport feeds it text and
//! selection data and renders the returned `Reply` values.

use crate::error::ErrorType;
use crate::model::{Kind, LedgerEntry};
use crate::period::{parse_custom_range, resolve_period, PeriodSelector, ResolvedInterval};
use crate::report::generate_report;
use crate::session::{SessionState, SessionStore};
use crate::store::EntryStore;
use crate::Result;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, info};

pub const EXPENSE_BUTTON: &str = "➖ Expense";
pub const INCOME_BUTTON: &str = "➕ Income";
pub const REPORT_BUTTON: &str = "📊 Report";

/// Selection data of the period menu is this prefix followed by a `PeriodSelector` id.
pub const REPORT_PREFIX: &str = "report:";

pub const GREETING: &str =
    "Hi! I will help you keep track of your income and expenses.\nChoose an action:";
pub const CATEGORY_PROMPT: &str =
    "Enter a *category/description* (for example: food, rent, salary)...";
pub const EMPTY_CATEGORY: &str = "The category cannot be empty. Enter a *category/description*:";
pub const AMOUNT_PROMPT: &str = "Now enter the *amount* (for example: 125000.50):";
pub const INVALID_AMOUNT: &str = "That does not look like a number. Enter an amount like `125000.50`";
pub const PERIOD_PROMPT: &str = "Choose a period:";
pub const CUSTOM_RANGE_PROMPT: &str = "Enter the period as `YYYY-MM-DD YYYY-MM-DD` (start and end \
    inclusive). Example: `2025-09-01 2025-09-29`";
pub const UNKNOWN_PERIOD: &str = "Unknown period";
pub const NOT_UNDERSTOOD: &str = "Use /menu to see what I can do.";
pub const EXPORT_CAPTION: &str = "Excel export";

/// Something to show the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reply {
    Text(String),
    /// Text shown together with the main menu buttons.
    MainMenu(String),
    /// Text shown together with the period choices from `period_choices`.
    PeriodMenu(String),
    /// A file to send.
    Document { path: PathBuf, caption: String },
}

impl Reply {
    fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

/// The buttons of the main menu, by row.
pub const MAIN_MENU: &[&[&str]] = &[&[EXPENSE_BUTTON, INCOME_BUTTON], &[REPORT_BUTTON]];

/// The selection data and label of every period menu choice, e.g. `("report:7d", "Last 7 days")`.
pub fn period_choices() -> Vec<(String, &'static str)> {
    PeriodSelector::ALL
        .iter()
        .map(|selector| (format!("{REPORT_PREFIX}{selector}"), selector.label()))
        .collect()
}

/// Parses an amount typed by a user. A comma is read as the decimal point. Accepts an optional
/// leading minus, digits, and an optional fraction, e.g. `125000.50`, `12,5` or `-3`.
pub fn parse_amount(text: &str) -> Option<f64> {
    let normalized = text.replace(',', ".");
    let normalized = normalized.trim();
    if !AMOUNT.is_match(normalized) {
        return None;
    }
    normalized.parse().ok()
}

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("valid amount pattern"));

/// Drives the dialogue for any number of users.
#[derive(Debug)]
pub struct Conversation<S, T> {
    store: S,
    sessions: T,
    exports: PathBuf,
}

impl<S, T> Conversation<S, T>
where
    S: EntryStore,
    T: SessionStore,
{
    /// `exports` is the directory report workbooks are written to.
    pub fn new(store: S, sessions: T, exports: impl Into<PathBuf>) -> Self {
        Self {
            store,
            sessions,
            exports: exports.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handles a text message from `user_id`. New entries are stamped with `now`.
    ///
    /// Menu commands and buttons are recognized first, whatever the user was in the middle of.
    /// Anything else is interpreted according to the user's session state.
    ///
    /// # Errors
    /// Only failures the user cannot fix by typing something else, such as a database or
    /// storage failure. Bad input is answered with a `Reply` instead.
    pub async fn handle_message(
        &self,
        user_id: i64,
        text: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<Reply>> {
        let trimmed = text.trim();
        match trimmed {
            "/start" | "/menu" => {
                self.sessions.clear(user_id).await;
                return Ok(vec![Reply::MainMenu(GREETING.to_string())]);
            }
            EXPENSE_BUTTON | INCOME_BUTTON => {
                let kind = if trimmed == EXPENSE_BUTTON {
                    Kind::Expense
                } else {
                    Kind::Income
                };
                self.sessions
                    .set(user_id, SessionState::AwaitCategory { kind })
                    .await;
                return Ok(vec![Reply::text(CATEGORY_PROMPT)]);
            }
            REPORT_BUTTON => return Ok(vec![Reply::PeriodMenu(PERIOD_PROMPT.to_string())]),
            _ => {}
        }

        match self.sessions.get(user_id).await {
            Some(SessionState::AwaitCategory { kind }) => {
                if trimmed.is_empty() {
                    return Ok(vec![Reply::text(EMPTY_CATEGORY)]);
                }
                let state = SessionState::AwaitAmount {
                    kind,
                    category: trimmed.to_string(),
                };
                self.sessions.set(user_id, state).await;
                Ok(vec![Reply::text(AMOUNT_PROMPT)])
            }
            Some(SessionState::AwaitAmount { kind, category }) => {
                self.record(user_id, kind, category, trimmed, now).await
            }
            Some(SessionState::AwaitCustomRange) => match parse_custom_range(trimmed) {
                Ok(interval) => {
                    let replies = self.send_report(user_id, &interval).await?;
                    self.sessions.clear(user_id).await;
                    Ok(replies)
                }
                Err(e) if e.error_type() == ErrorType::InvalidRange => {
                    debug!("Custom range from user {user_id} rejected: {e}");
                    Ok(vec![Reply::Text(e.to_string())])
                }
                Err(e) => Err(e),
            },
            None => Ok(vec![Reply::MainMenu(NOT_UNDERSTOOD.to_string())]),
        }
    }

    /// Handles a period menu selection such as `report:this_month`, resolved against `today`.
    pub async fn handle_callback(
        &self,
        user_id: i64,
        data: &str,
        today: NaiveDate,
    ) -> Result<Vec<Reply>> {
        let selector = data
            .strip_prefix(REPORT_PREFIX)
            .and_then(|id| PeriodSelector::from_str(id).ok());
        let Some(selector) = selector else {
            debug!("Unknown selection '{data}' from user {user_id}");
            return Ok(vec![Reply::text(UNKNOWN_PERIOD)]);
        };
        match selector.preset() {
            Some(request) => {
                let interval = resolve_period(&request, today)?;
                self.send_report(user_id, &interval).await
            }
            None => {
                self.sessions
                    .set(user_id, SessionState::AwaitCustomRange)
                    .await;
                Ok(vec![Reply::text(CUSTOM_RANGE_PROMPT)])
            }
        }
    }

    /// Builds the report of `user_id` over `interval`: the text summary followed by the workbook.
    pub async fn send_report(
        &self,
        user_id: i64,
        interval: &ResolvedInterval,
    ) -> Result<Vec<Reply>> {
        let report = generate_report(&self.store, user_id, interval, &self.exports).await?;
        Ok(vec![
            Reply::text(report.text_summary()),
            Reply::Document {
                path: report.spreadsheet_path().to_path_buf(),
                caption: EXPORT_CAPTION.to_string(),
            },
        ])
    }

    async fn record(
        &self,
        user_id: i64,
        kind: Kind,
        category: String,
        text: &str,
        now: NaiveDateTime,
    ) -> Result<Vec<Reply>> {
        let Some(amount) = parse_amount(text) else {
            return Ok(vec![Reply::text(INVALID_AMOUNT)]);
        };
        let marker = if kind.is_expense() { "➖" } else { "➕" };
        let entry = LedgerEntry::new(kind, category, amount, now);
        match self.store.add_entry(user_id, &entry).await {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => return Ok(vec![Reply::Text(e.to_string())]),
            Err(e) => return Err(e),
        }
        self.sessions.clear(user_id).await;
        info!(
            "Recorded {} {} '{}' for user {user_id}",
            entry.kind(),
            entry.amount(),
            entry.category()
        );
        Ok(vec![Reply::MainMenu(format!(
            "{marker} Recorded: *{}* — *{amount:.2}*",
            entry.category()
        ))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_timestamp;
    use crate::test::TestEnv;

    const USER: i64 = 7;

    fn now() -> NaiveDateTime {
        parse_timestamp("2025-09-15T12:00:00").unwrap()
    }

    fn today() -> NaiveDate {
        now().date()
    }

    fn text(replies: &[Reply]) -> &str {
        match replies.first() {
            Some(Reply::Text(s)) | Some(Reply::MainMenu(s)) | Some(Reply::PeriodMenu(s)) => s,
            other => panic!("expected a text reply, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("125000.50"), Some(125000.5));
        assert_eq!(parse_amount(" 12,5 "), Some(12.5));
        assert_eq!(parse_amount("-3"), Some(-3.0));
        assert_eq!(parse_amount("007"), Some(7.0));
        for bad in [
            "", "-", "--1", "abc", "1.", ".5", "1.2.3", "1,2,3", "1e3", "+1", "1 000", "12a", "١٢",
        ] {
            assert_eq!(parse_amount(bad), None, "{bad}");
        }
    }

    #[test]
    fn test_period_choices() {
        let ids: Vec<String> = period_choices().into_iter().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec![
                "report:7d",
                "report:this_month",
                "report:last_month",
                "report:custom"
            ]
        );
    }

    #[tokio::test]
    async fn test_start_shows_main_menu() {
        let env = TestEnv::new().await;
        let chat = env.conversation();
        let replies = chat.handle_message(USER, "/start", now()).await.unwrap();
        assert_eq!(replies, vec![Reply::MainMenu(GREETING.to_string())]);
    }

    #[tokio::test]
    async fn test_expense_dialogue() {
        let env = TestEnv::new().await;
        let chat = env.conversation();

        let r = chat.handle_message(USER, EXPENSE_BUTTON, now()).await.unwrap();
        assert_eq!(text(&r), CATEGORY_PROMPT);
        let r = chat.handle_message(USER, "   ", now()).await.unwrap();
        assert_eq!(text(&r), EMPTY_CATEGORY);
        let r = chat.handle_message(USER, "  food ", now()).await.unwrap();
        assert_eq!(text(&r), AMOUNT_PROMPT);
        let r = chat.handle_message(USER, "lots", now()).await.unwrap();
        assert_eq!(text(&r), INVALID_AMOUNT);
        let r = chat.handle_message(USER, "12,5", now()).await.unwrap();
        assert_eq!(
            r,
            vec![Reply::MainMenu("➖ Recorded: *food* — *12.50*".to_string())]
        );

        let stored = chat
            .store()
            .fetch_entries(USER, "2025-09-15T00:00:00", "2025-09-16T00:00:00")
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind(), &Kind::Expense);
        assert_eq!(stored[0].category(), "food");
        assert_eq!(stored[0].amount(), 12.5);
        assert_eq!(stored[0].created_at(), now());

        // The session is finished, so a number is no longer an amount.
        let r = chat.handle_message(USER, "5", now()).await.unwrap();
        assert_eq!(r, vec![Reply::MainMenu(NOT_UNDERSTOOD.to_string())]);
    }

    #[tokio::test]
    async fn test_income_marker() {
        let env = TestEnv::new().await;
        let chat = env.conversation();
        chat.handle_message(USER, INCOME_BUTTON, now()).await.unwrap();
        chat.handle_message(USER, "salary", now()).await.unwrap();
        let r = chat.handle_message(USER, "1000", now()).await.unwrap();
        assert_eq!(text(&r), "➕ Recorded: *salary* — *1000.00*");
    }

    #[tokio::test]
    async fn test_buttons_take_priority_over_session() {
        let env = TestEnv::new().await;
        let chat = env.conversation();
        chat.handle_message(USER, INCOME_BUTTON, now()).await.unwrap();
        let r = chat.handle_message(USER, REPORT_BUTTON, now()).await.unwrap();
        assert_eq!(r, vec![Reply::PeriodMenu(PERIOD_PROMPT.to_string())]);
        // The pending category question is still open.
        let r = chat.handle_message(USER, "gift", now()).await.unwrap();
        assert_eq!(text(&r), AMOUNT_PROMPT);
    }

    #[tokio::test]
    async fn test_preset_report() {
        let env = TestEnv::new().await;
        env.insert_entries(USER, &crate::report::tests::sample_entries())
            .await;
        let chat = env.conversation();

        let r = chat
            .handle_callback(USER, "report:this_month", today())
            .await
            .unwrap();
        assert_eq!(r.len(), 2);
        assert!(text(&r).contains("✅ Balance: *750.00*"), "{}", text(&r));
        match &r[1] {
            Reply::Document { path, caption } => {
                assert_eq!(caption, EXPORT_CAPTION);
                assert!(path.is_file());
                assert!(path.starts_with(env.config().exports()));
                assert!(path.ends_with("report_7_2025-09-01_2025-09-30.xlsx"));
            }
            other => panic!("expected a document, got {other:?}"),
        }

        let r = chat
            .handle_callback(USER, "report:last_month", today())
            .await
            .unwrap();
        assert_eq!(text(&r), crate::report::NO_RECORDS);
    }

    #[tokio::test]
    async fn test_custom_report_dialogue() {
        let env = TestEnv::new().await;
        env.insert_entries(USER, &crate::report::tests::sample_entries())
            .await;
        let chat = env.conversation();

        let r = chat
            .handle_callback(USER, "report:custom", today())
            .await
            .unwrap();
        assert_eq!(text(&r), CUSTOM_RANGE_PROMPT);

        let r = chat.handle_message(USER, "2025-09-01", now()).await.unwrap();
        assert!(text(&r).starts_with("Two dates"), "{}", text(&r));
        let r = chat
            .handle_message(USER, "2025-09-01 2025-9-x", now())
            .await
            .unwrap();
        assert!(text(&r).starts_with("Dates must be"), "{}", text(&r));
        let r = chat
            .handle_message(USER, "2025-09-05 2025-09-01", now())
            .await
            .unwrap();
        assert!(text(&r).contains("is after"), "{}", text(&r));

        let r = chat
            .handle_message(USER, "2025-09-02 2025-09-03", now())
            .await
            .unwrap();
        assert_eq!(r.len(), 2);
        assert!(text(&r).contains("💸 Expense: *250.00*"), "{}", text(&r));
        assert!(text(&r).contains("💰 Income: *0.00*"), "{}", text(&r));

        // Back to the idle state.
        let r = chat
            .handle_message(USER, "2025-09-02 2025-09-03", now())
            .await
            .unwrap();
        assert_eq!(r, vec![Reply::MainMenu(NOT_UNDERSTOOD.to_string())]);
    }

    #[tokio::test]
    async fn test_unknown_period() {
        let env = TestEnv::new().await;
        let chat = env.conversation();
        for data in ["report:yesterday", "report:", "something:7d"] {
            let r = chat.handle_callback(USER, data, today()).await.unwrap();
            assert_eq!(r, vec![Reply::Text(UNKNOWN_PERIOD.to_string())]);
        }
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let env = TestEnv::new().await;
        let chat = env.conversation();
        chat.handle_message(1, EXPENSE_BUTTON, now()).await.unwrap();
        chat.handle_message(2, INCOME_BUTTON, now()).await.unwrap();
        chat.handle_message(1, "rent", now()).await.unwrap();
        chat.handle_message(2, "salary", now()).await.unwrap();
        let r = chat.handle_message(1, "900", now()).await.unwrap();
        assert_eq!(text(&r), "➖ Recorded: *rent* — *900.00*");
        let r = chat.handle_message(2, "2000", now()).await.unwrap();
        assert_eq!(text(&r), "➕ Recorded: *salary* — *2000.00*");
    }
}
