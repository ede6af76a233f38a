use crate::args::ReportArgs;
use crate::commands::{resolve_user, Out};
use crate::error::{Error, ErrorType};
use crate::period::{resolve_period, PeriodRequest, PeriodSelector, ResolvedInterval};
use crate::report::{generate_report, ReportResult};
use crate::{Config, Result};
use anyhow::anyhow;
use chrono::{Local, NaiveDate};

/// Builds the report of one user over the requested period. The text summary becomes the message
/// and the workbook is written to `--out` or the configured exports directory.
///
/// # Errors
/// - `Input` if no user can be determined or `--period custom` lacks dates.
/// - `InvalidRange` if the period cannot be resolved.
/// - `Database` or `StorageWrite` if reading the entries or writing the workbook fails.
pub async fn report(config: Config, args: ReportArgs) -> Result<Out<ReportResult>> {
    let user_id = resolve_user(&config, args.user())?;
    let today = args
        .today()
        .unwrap_or_else(|| Local::now().date_naive());
    let interval = resolve_interval(&args, today)?;
    let out_dir = args.out().unwrap_or(config.exports());

    let result = generate_report(config.db(), user_id, &interval, out_dir).await?;
    let message = format!(
        "{}\n\nSpreadsheet written to {}",
        result.text_summary(),
        result.spreadsheet_path().display()
    );
    Ok(Out::new(message, result))
}

fn resolve_interval(args: &ReportArgs, today: NaiveDate) -> Result<ResolvedInterval> {
    let request = if let Some(month) = args.month() {
        parse_month(month)?
    } else if let Some(days) = args.days() {
        PeriodRequest::LastDays(days)
    } else if let (Some(start), Some(end_inclusive)) = (args.from(), args.to()) {
        PeriodRequest::Custom {
            start,
            end_inclusive,
        }
    } else {
        let selector = args.period().unwrap_or(PeriodSelector::ThisMonth);
        selector.preset().ok_or_else(|| {
            Error::new(
                ErrorType::Input,
                anyhow!("--period {selector} needs --from and --to"),
            )
        })?
    };
    resolve_period(&request, today)
}

/// Parses `YYYY-MM`.
fn parse_month(text: &str) -> Result<PeriodRequest> {
    let invalid = || {
        Error::new(
            ErrorType::InvalidRange,
            anyhow!("Months must be in the format YYYY-MM, got '{text}'"),
        )
    };
    let (year, month) = text.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    Ok(PeriodRequest::Month { year, month })
}
