//! Container command handlers.

use tabled::Tabled;

use lighthouse_core::{ContainerCard, Dashboard, EntityMachine, EntityStatus, UpdateCheck, UpdateOutcome};

use crate::cli::{ContainersArgs, ContainersCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct ContainerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Image")]
    image: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Update")]
    update: String,
    #[tabled(rename = "Excluded")]
    excluded: String,
}

impl ContainerRow {
    pub(crate) fn new(card: &ContainerCard, color: bool) -> Self {
        let c = &card.container;
        Self {
            id: c.short_id.clone(),
            name: c.name.clone(),
            image: c.image.clone(),
            state: c.status.clone(),
            update: update_column(card, color),
            excluded: output::flag(c.excluded, color),
        }
    }
}

/// Local operation state when there is one, else the server's cached check.
fn update_column(card: &ContainerCard, color: bool) -> String {
    match card.entity.as_ref().map(EntityMachine::status) {
        Some(EntityStatus::Idle) | None => {}
        Some(status) => return output::status_label(status, color),
    }
    let status = match &card.container.server_check {
        Some(UpdateCheck::UpToDate) => EntityStatus::UpToDate,
        Some(UpdateCheck::Available(delta)) => EntityStatus::UpdateAvailable(delta.clone()),
        Some(UpdateCheck::Skipped { reason }) => EntityStatus::Skipped {
            reason: reason.clone(),
        },
        Some(UpdateCheck::Failed { message }) => EntityStatus::Error {
            message: message.clone(),
        },
        None => return "-".into(),
    };
    output::status_label(&status, color)
}

fn status_detail(name: &str, status: &EntityStatus) -> String {
    match status {
        EntityStatus::UpdateAvailable(delta) => {
            let mut lines = vec![format!("{name}: update available")];
            if let Some(image) = &delta.image {
                lines.push(format!("  Image:   {image}"));
            }
            if let Some(current) = &delta.current {
                lines.push(format!("  Current: {}", current.short()));
            }
            if let Some(latest) = &delta.latest {
                lines.push(format!("  Latest:  {}", latest.short()));
            }
            lines.join("\n")
        }
        EntityStatus::UpToDate => format!("{name}: up to date"),
        EntityStatus::Skipped { reason } => format!("{name}: skipped ({reason})"),
        EntityStatus::Error { message } => format!("{name}: error ({message})"),
        other => format!("{name}: {}", other.label()),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard,
    args: ContainersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        ContainersCommand::List => {
            dashboard.refresh_containers().await?;
            let cards = dashboard.cards();
            let out = output::render_list(
                &global.output,
                &cards,
                |card| ContainerRow::new(card, color),
                |card| card.container.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ContainersCommand::Check { container } => {
            let c = util::resolve_container(dashboard, &container).await?;
            let status = dashboard.check_update(&c.id).await?;
            let out = output::render_single(
                &global.output,
                &status,
                |s| status_detail(&c.name, s),
                |s| s.label().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ContainersCommand::Update { container } => {
            let c = util::resolve_container(dashboard, &container).await?;
            let token = dashboard.request_update(&c.id)?;
            if !util::confirm(&token.prompt(), "containers update", global.yes)? {
                eprintln!("Update cancelled");
                return Ok(());
            }
            match dashboard.confirm_update(token).await? {
                UpdateOutcome::Success { message, new_id } => {
                    if !global.quiet {
                        eprintln!("✓ {message}");
                        if let Some(new_id) = new_id {
                            eprintln!("  New container ID: {new_id}");
                        }
                    }
                    Ok(())
                }
                UpdateOutcome::Failure { message } => Err(CliError::OperationFailed { message }),
            }
        }

        ContainersCommand::Exclude { container } => {
            set_exclusion(dashboard, &container, true, global).await
        }

        ContainersCommand::Include { container } => {
            set_exclusion(dashboard, &container, false, global).await
        }
    }
}

async fn set_exclusion(
    dashboard: &Dashboard,
    identifier: &str,
    excluded: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let c = util::resolve_container(dashboard, identifier).await?;
    let verb = if excluded { "excluded from" } else { "included in" };
    if c.excluded == excluded {
        if !global.quiet {
            eprintln!("{} is already {verb} updates", c.name);
        }
        return Ok(());
    }

    dashboard.set_exclusion(&c.id, excluded).await?;
    let now = dashboard.entity(&c.id).map_or(excluded, |m| m.excluded());
    if !global.quiet {
        if now == excluded {
            eprintln!("✓ {} {verb} updates", c.name);
        } else {
            eprintln!("Server accepted the change but {} still reports the old state", c.name);
        }
    }
    Ok(())
}
