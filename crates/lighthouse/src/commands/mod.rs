//! Command dispatch: bridges CLI args -> dashboard operations -> output formatting.

pub mod config_cmd;
pub mod containers;
pub mod history;
pub mod schedule;
pub mod settings;
pub mod update_all;
pub mod util;
pub mod watch;

use lighthouse_core::{Dashboard, DashboardConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
///
/// Everything except `watch` runs inside [`Dashboard::oneshot`]: poll
/// timers stay off and each handler refreshes exactly what it shows.
pub async fn dispatch(
    cmd: Command,
    config: DashboardConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if matches!(cmd, Command::Watch) {
        return watch::handle(config, global).await;
    }

    Dashboard::oneshot(config, |dashboard| async move {
        let result = match cmd {
            Command::Containers(args) => containers::handle(&dashboard, args, global).await,
            Command::UpdateAll => update_all::handle(&dashboard, global).await,
            Command::Settings(args) => settings::handle(&dashboard, args, global).await,
            Command::History(args) => history::handle(&dashboard, args, global).await,
            Command::Schedule => schedule::handle(&dashboard, global).await,
            // Handled before the dashboard is built
            Command::Watch | Command::Config(_) | Command::Completions(_) => Err(
                CliError::Internal("command does not run against a server".into()),
            ),
        };
        Ok(result)
    })
    .await?
}
