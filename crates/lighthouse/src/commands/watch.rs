//! Live container view.
//!
//! Connects the dashboard with its poll timers running and re-renders the
//! container cards whenever the snapshot or any entity state changes.

use std::io::IsTerminal;

use chrono::Local;
use tracing::debug;

use lighthouse_core::{Dashboard, DashboardConfig};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::containers::ContainerRow;

fn render(dashboard: &Dashboard, global: &GlobalOpts, color: bool) -> String {
    let cards = dashboard.cards();
    let body = output::render_list(
        &global.output,
        &cards,
        |card| ContainerRow::new(card, color),
        |card| card.container.id.clone(),
    );
    if !matches!(global.output, OutputFormat::Table) {
        return body;
    }

    let state = dashboard.containers().snapshot();
    let mut header = format!(
        "{} containers, updated {}",
        cards.len(),
        Local::now().format("%H:%M:%S")
    );
    if let Some(err) = &state.error {
        header = format!("{header}  (last refresh failed: {err})");
    }
    format!("{header}\n{body}")
}

pub async fn handle(config: DashboardConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let dashboard = Dashboard::new(config)?;
    dashboard.connect().await;

    let color = output::should_color(&global.color);
    let redraw = matches!(global.output, OutputFormat::Table) && std::io::stdout().is_terminal();
    let mut containers = dashboard.containers().stream();
    let mut entities = dashboard.entities().subscribe();

    loop {
        if redraw {
            print!("\x1b[2J\x1b[H");
        }
        output::print_output(&render(&dashboard, global, color), global.quiet);

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            changed = containers.changed() => {
                if changed.is_none() {
                    break;
                }
            }
            changed = entities.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    dashboard.disconnect().await;
    Ok(())
}
