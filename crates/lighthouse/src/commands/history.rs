//! History command handlers.

use tabled::Tabled;

use lighthouse_core::{Dashboard, HistoryEntry, HistoryFilter};

use crate::cli::{GlobalOpts, HistoryArgs, HistoryCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Trigger")]
    trigger: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&HistoryEntry> for HistoryRow {
    fn from(e: &HistoryEntry) -> Self {
        Self {
            time: e.timestamp.map_or_else(
                || e.timestamp_raw.clone(),
                |ts| ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
            container: e.container.clone().unwrap_or_else(|| "-".into()),
            action: e.action.clone(),
            trigger: e.trigger.clone().unwrap_or_default(),
            status: e.status.clone(),
            message: e.message.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(
    dashboard: &Dashboard,
    args: HistoryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        HistoryCommand::List {
            action,
            status,
            limit,
        } => {
            let history = dashboard.history();
            history
                .refresh(Some(HistoryFilter {
                    action,
                    status,
                    limit,
                }))
                .await?;
            let state = history.poller().snapshot();
            let entries = state.data.as_deref().map_or(&[][..], Vec::as_slice);
            let out = output::render_list(
                &global.output,
                entries,
                |e| HistoryRow::from(e),
                |e| e.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        HistoryCommand::Clear => {
            if !util::confirm(
                "Delete the entire update history? This cannot be undone.",
                "history clear",
                global.yes,
            )? {
                return Ok(());
            }
            dashboard.history().clear().await?;
            if !global.quiet {
                eprintln!("History cleared");
            }
            Ok(())
        }
    }
}
