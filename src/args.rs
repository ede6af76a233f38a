//! These structs provide the CLI interface for the fintrack CLI.

use crate::model::Kind;
use crate::period::PeriodSelector;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// fintrack: Keep track of your income and expenses and export period reports to Excel.
///
/// Entries are kept per user in a local SQLite database. Reports summarize a period by category
/// and write a workbook with the raw records, the per-category totals and an overall summary.
///
/// The chat subcommand runs the same menu-driven dialogue a messenger bot would, on the terminal.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and the database.
    ///
    /// This is the first command you should run. By default everything lives in $HOME/finance;
    /// pass --finance-home (or set FINANCE_HOME) to put it somewhere else.
    Init(InitArgs),
    /// Record an income or an expense.
    Add(AddArgs),
    /// Summarize a period by category and export it to an Excel workbook.
    Report(ReportArgs),
    /// Run the menu-driven dialogue on stdin and stdout.
    ///
    /// Type the button labels to use the main menu. Period choices are entered as their selection
    /// data, e.g. report:7d. End the session with /quit or end of input.
    Chat(ChatArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the finance data and configuration is held. Defaults to ~/finance
    #[arg(long, env = "FINANCE_HOME", default_value_t = default_finance_home())]
    finance_home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn finance_home(&self) -> &DisplayPath {
        &self.finance_home
    }
}

/// Args for the `fintrack init` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct InitArgs {
    /// Where report workbooks are written. Relative paths are resolved against the finance home.
    /// Defaults to $FINANCE_HOME/exports.
    #[arg(long)]
    exports_dir: Option<PathBuf>,
}

impl InitArgs {
    pub fn exports_dir(&self) -> Option<&Path> {
        self.exports_dir.as_deref()
    }
}

/// Args for the `fintrack add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The user the entry belongs to. Defaults to default_user_id from config.json.
    #[arg(long)]
    user: Option<i64>,

    /// Either income or expense.
    #[arg(long)]
    kind: Kind,

    /// A category or short description, e.g. food or salary.
    #[arg(long)]
    category: String,

    /// The amount, e.g. 125000.50. A comma may be used as the decimal point.
    #[arg(long, allow_hyphen_values = true)]
    amount: String,

    /// When the entry happened, as YYYY-MM-DDTHH:MM:SS in local time. Defaults to now.
    #[arg(long)]
    at: Option<String>,
}

impl AddArgs {
    pub fn new(
        user: Option<i64>,
        kind: Kind,
        category: impl Into<String>,
        amount: impl Into<String>,
        at: Option<String>,
    ) -> Self {
        Self {
            user,
            kind,
            category: category.into(),
            amount: amount.into(),
            at,
        }
    }

    pub fn user(&self) -> Option<i64> {
        self.user
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn at(&self) -> Option<&str> {
        self.at.as_deref()
    }
}

/// Args for the `fintrack report` command.
///
/// Exactly one way of choosing the period applies. In order of precedence: --month, --days,
/// --from/--to, --period. With none of them the current calendar month is reported.
#[derive(Debug, Default, Parser, Clone)]
pub struct ReportArgs {
    /// The user to report on. Defaults to default_user_id from config.json.
    #[arg(long)]
    user: Option<i64>,

    /// One of 7d, this_month, last_month or custom. custom needs --from and --to.
    #[arg(long, conflicts_with_all = ["month", "days"])]
    period: Option<PeriodSelector>,

    /// An explicit calendar month as YYYY-MM.
    #[arg(long, conflicts_with_all = ["days", "from", "to"])]
    month: Option<String>,

    /// Today plus this many days before it.
    #[arg(long, conflicts_with_all = ["from", "to"])]
    days: Option<u32>,

    /// First day of a custom range, YYYY-MM-DD.
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,

    /// Last day of a custom range, YYYY-MM-DD. This day is included.
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,

    /// Resolve relative periods as if today were this date, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Write the workbook here instead of the configured exports directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ReportArgs {
    pub fn user(&self) -> Option<i64> {
        self.user
    }

    pub fn period(&self) -> Option<PeriodSelector> {
        self.period
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    pub fn days(&self) -> Option<u32> {
        self.days
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    pub fn today(&self) -> Option<NaiveDate> {
        self.today
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }

    pub fn with_user(mut self, user: i64) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_period(mut self, period: PeriodSelector) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_month(mut self, month: impl Into<String>) -> Self {
        self.month = Some(month.into());
        self
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = Some(days);
        self
    }

    pub fn with_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_out(mut self, out: impl Into<PathBuf>) -> Self {
        self.out = Some(out.into());
        self
    }
}

/// Args for the `fintrack chat` command.
#[derive(Debug, Parser, Clone)]
pub struct ChatArgs {
    /// The user to act as. Defaults to default_user_id from config.json.
    #[arg(long)]
    user: Option<i64>,
}

impl ChatArgs {
    pub fn user(&self) -> Option<i64> {
        self.user
    }
}

fn default_finance_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("finance"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --finance-home or FINANCE_HOME instead of relying on the default \
                finance home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("finance")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
