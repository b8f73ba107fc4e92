//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use lighthouse_core::{BulkRowStatus, EntityStatus};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Entity status label, colored by outcome.
pub fn status_label(status: &EntityStatus, color: bool) -> String {
    let label = match status {
        EntityStatus::UpdateAvailable(_) => "update available",
        EntityStatus::UpToDate => "up to date",
        other => other.label(),
    };
    if !color {
        return label.to_owned();
    }
    match status {
        EntityStatus::UpdateAvailable(_) => label.yellow().bold().to_string(),
        EntityStatus::UpToDate => label.green().to_string(),
        EntityStatus::Error { .. } => label.red().to_string(),
        EntityStatus::Checking | EntityStatus::Updating { .. } => label.cyan().to_string(),
        EntityStatus::Idle | EntityStatus::Skipped { .. } => label.dimmed().to_string(),
    }
}

/// Bulk row status, colored by outcome.
pub fn bulk_status_label(status: BulkRowStatus, color: bool) -> String {
    let label = status.to_string().replace('_', " ");
    if !color {
        return label;
    }
    match status {
        BulkRowStatus::Updated => label.green().bold().to_string(),
        BulkRowStatus::UpToDate => label.green().to_string(),
        BulkRowStatus::Error => label.red().to_string(),
        BulkRowStatus::Skipped | BulkRowStatus::Unknown => label.dimmed().to_string(),
    }
}

/// `yes`/`no`, with `yes` highlighted.
pub fn flag(value: bool, color: bool) -> String {
    match (value, color) {
        (true, true) => "yes".yellow().to_string(),
        (true, false) => "yes".into(),
        (false, _) => "no".into(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub(crate) fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("error: serialization failed: {e}"))
}

#[cfg(test)]
mod tests {
    use lighthouse_core::{BulkRowStatus, EntityStatus};

    use super::*;

    #[test]
    fn plain_labels_without_color() {
        assert_eq!(status_label(&EntityStatus::UpToDate, false), "up to date");
        assert_eq!(
            status_label(
                &EntityStatus::Error {
                    message: "boom".into()
                },
                false
            ),
            "error"
        );
        assert_eq!(bulk_status_label(BulkRowStatus::UpToDate, false), "up to date");
    }

    #[test]
    fn plain_format_emits_one_id_per_line() {
        #[derive(serde::Serialize, Tabled)]
        struct Row {
            id: String,
        }
        let rows = vec![Row { id: "a".into() }, Row { id: "b".into() }];
        let out = render_list(
            &OutputFormat::Plain,
            &rows,
            |r| Row { id: r.id.clone() },
            |r| r.id.clone(),
        );
        assert_eq!(out, "a\nb");
    }
}
