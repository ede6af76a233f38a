use crate::args::AddArgs;
use crate::chat::parse_amount;
use crate::commands::{resolve_user, Out};
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{parse_timestamp, LedgerEntry};
use crate::store::EntryStore;
use crate::{Config, Result};
use anyhow::anyhow;
use chrono::Local;

/// Records one entry in the local database.
///
/// The amount follows the same rules as in the chat dialogue, so `12,5` is accepted. Without
/// `--at` the entry is stamped with the current local time.
///
/// # Errors
/// - `Input` if the user, amount, timestamp or category cannot be used.
/// - `Database` if the insert fails.
pub async fn add(config: Config, args: AddArgs) -> Result<Out<LedgerEntry>> {
    let user_id = resolve_user(&config, args.user())?;
    let amount = parse_amount(args.amount()).ok_or_else(|| {
        Error::new(
            ErrorType::Input,
            anyhow!("'{}' is not an amount, use something like 125000.50", args.amount()),
        )
    })?;
    let created_at = match args.at() {
        Some(at) => parse_timestamp(at).pub_result(ErrorType::Input)?,
        None => Local::now().naive_local(),
    };

    let entry = LedgerEntry::new(args.kind().clone(), args.category(), amount, created_at);
    config.db().add_entry(user_id, &entry).await?;

    let message = format!(
        "Recorded {} '{}' of {:.2} for user {user_id}",
        entry.kind(),
        entry.category(),
        entry.amount()
    );
    Ok(Out::new(message, entry))
}
