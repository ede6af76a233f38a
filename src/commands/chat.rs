use crate::chat::{period_choices, Conversation, Reply, MAIN_MENU, REPORT_PREFIX};
use crate::commands::{resolve_user, Out};
use crate::error::{ErrorType, IntoResult, Res};
use crate::session::{MemorySessions, SessionStore};
use crate::store::EntryStore;
use crate::{Config, Result};
use anyhow::Context;
use chrono::Local;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error};

const QUIT: &str = "/quit";

/// Runs the dialogue on stdin and stdout until `/quit` or end of input.
///
/// Each line is a message, except lines starting with `report:` which are period menu selections.
/// Entries are stamped with the local time at which their amount line is read.
pub async fn chat(config: Config, user: Option<i64>) -> Result<Out<usize>> {
    let user_id = resolve_user(&config, user)?;
    let conversation = Conversation::new(
        config.db().clone(),
        MemorySessions::new(),
        config.exports(),
    );
    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    let handled = run(&conversation, user_id, input, &mut output)
        .await
        .pub_result(ErrorType::Input)?;
    Ok(Out::new(
        format!("Chat session ended after {handled} messages"),
        handled,
    ))
}

/// Feeds `input` line by line to `conversation` and renders the replies to `output`. Returns the
/// number of lines handled.
pub(crate) async fn run<S, T, R, W>(
    conversation: &Conversation<S, T>,
    user_id: i64,
    input: R,
    output: &mut W,
) -> Res<usize>
where
    S: EntryStore,
    T: SessionStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut handled = 0;
    while let Some(line) = lines.next_line().await.context("Unable to read input")? {
        let line = line.trim();
        if line == QUIT {
            break;
        }
        if line.is_empty() {
            continue;
        }
        handled += 1;
        let now = Local::now().naive_local();
        let replies = if line.starts_with(REPORT_PREFIX) {
            conversation.handle_callback(user_id, line, now.date()).await
        } else {
            conversation.handle_message(user_id, line, now).await
        };
        match replies {
            Ok(replies) => {
                for reply in &replies {
                    output
                        .write_all(render(reply).as_bytes())
                        .await
                        .context("Unable to write output")?;
                }
            }
            // The session stays usable after a storage failure.
            Err(e) => error!("Unable to handle '{line}': {e}"),
        }
        output.flush().await.context("Unable to flush output")?;
    }
    debug!("Chat input for user {user_id} finished after {handled} messages");
    Ok(handled)
}

fn render(reply: &Reply) -> String {
    match reply {
        Reply::Text(text) => format!("{text}\n\n"),
        Reply::MainMenu(text) => {
            let rows: Vec<String> = MAIN_MENU
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| format!("[{button}]"))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect();
            format!("{text}\n{}\n\n", rows.join("\n"))
        }
        Reply::PeriodMenu(text) => {
            let choices: Vec<String> = period_choices()
                .into_iter()
                .map(|(data, label)| format!("  {data:<18} {label}"))
                .collect();
            format!("{text}\n{}\n\n", choices.join("\n"))
        }
        Reply::Document { path, caption } => format!("📎 {caption}: {}\n\n", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{AMOUNT_PROMPT, CATEGORY_PROMPT, EXPORT_CAPTION, GREETING};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_run_dialogue() {
        let env = TestEnv::new().await;
        let conversation = env.conversation();
        let input = "/start\n➖ Expense\nfood\n\n42,5\n📊 Report\nreport:7d\n/quit\nignored\n";
        let mut output = Vec::new();

        let handled = run(&conversation, 9, input.as_bytes(), &mut output)
            .await
            .unwrap();
        assert_eq!(handled, 6);

        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with(GREETING), "{text}");
        assert!(text.contains("[➖ Expense] [➕ Income]\n[📊 Report]"), "{text}");
        assert!(text.contains(CATEGORY_PROMPT), "{text}");
        assert!(text.contains(AMOUNT_PROMPT), "{text}");
        assert!(text.contains("➖ Recorded: *food* — *42.50*"), "{text}");
        assert!(text.contains("report:this_month"), "{text}");
        assert!(text.contains("💸 Expense: *42.50*"), "{text}");
        assert!(text.contains(&format!("📎 {EXPORT_CAPTION}: ")), "{text}");
        assert!(!text.contains("ignored"));
    }

    #[tokio::test]
    async fn test_run_stops_at_end_of_input() {
        let env = TestEnv::new().await;
        let conversation = env.conversation();
        let mut output = Vec::new();
        let handled = run(&conversation, 9, "report:nope".as_bytes(), &mut output)
            .await
            .unwrap();
        assert_eq!(handled, 1);
        assert_eq!(String::from_utf8(output).unwrap(), "Unknown period\n\n");
    }
}
