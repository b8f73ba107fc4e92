//! Bulk "check & update all" handler.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Tabled;

use lighthouse_core::{BulkResult, BulkRow, BulkRun, Dashboard};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct BulkRowView {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Result")]
    status: String,
    #[tabled(rename = "Details")]
    details: String,
}

impl BulkRowView {
    fn new(row: &BulkRow, color: bool) -> Self {
        Self {
            name: row.name.clone(),
            status: output::bulk_status_label(row.status, color),
            details: row
                .message
                .clone()
                .or_else(|| row.reason.clone())
                .unwrap_or_default(),
        }
    }
}

fn summary_line(result: &BulkResult) -> String {
    let s = &result.summary;
    format!(
        "{} updated, {} up to date, {} skipped, {} errors ({} total)",
        s.updated, s.up_to_date, s.skipped, s.errors, s.total
    )
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.yellow} {msg} {elapsed:.dim}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
    }
    pb.set_message("Checking and updating all containers...");
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub async fn handle(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm(
        "Check and update every eligible container? Updated containers will be recreated.",
        "update-all",
        global.yes,
    )? {
        return Ok(());
    }

    // Reconcile first so locally excluded containers stay untouched.
    dashboard.refresh_containers().await?;

    let pb = spinner(global.quiet);
    let run = dashboard.update_all().await;
    pb.finish_and_clear();

    let result = match run? {
        BulkRun::Completed(result) => result,
        BulkRun::AlreadyRunning => {
            eprintln!("A bulk update is already running");
            return Ok(());
        }
    };

    let color = output::should_color(&global.color);
    match global.output {
        OutputFormat::Table => {
            if !result.rows.is_empty() {
                let rows: Vec<BulkRowView> =
                    result.rows.iter().map(|r| BulkRowView::new(r, color)).collect();
                output::print_output(&output::render_table(&rows), global.quiet);
            }
            output::print_output(&summary_line(&result), global.quiet);
        }
        _ => {
            let out = output::render_single(
                &global.output,
                result.as_ref(),
                summary_line,
                summary_line,
            );
            output::print_output(&out, global.quiet);
        }
    }

    if result.has_failures() {
        let failed: Vec<&str> = result.failures().map(|r| r.name.as_str()).collect();
        return Err(CliError::OperationFailed {
            message: format!("Some containers failed to update: {}", failed.join(", ")),
        });
    }
    Ok(())
}
