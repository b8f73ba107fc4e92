//! Scheduler status handler.

use std::time::Duration;

use chrono::{DateTime, Utc};

use lighthouse_core::{Dashboard, Schedule};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// `in 4m 10s` / `12m ago`, rounded to whole seconds.
fn relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = ts - now;
    let secs = delta.num_seconds().unsigned_abs();
    let span = humantime::format_duration(Duration::from_secs(secs));
    if delta.num_seconds() >= 0 {
        format!("in {span}")
    } else {
        format!("{span} ago")
    }
}

fn describe(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    ts.map_or_else(
        || "never".into(),
        |ts| {
            format!(
                "{} ({})",
                ts.format("%Y-%m-%d %H:%M:%S UTC"),
                relative(ts, now)
            )
        },
    )
}

fn detail(s: &Schedule) -> String {
    let now = Utc::now();
    let mut lines = vec![
        format!("Last check:  {}", describe(s.last_check, now)),
        format!("Next check:  {}", describe(s.next_check, now)),
    ];
    if let Some(minutes) = s.interval_minutes {
        lines.push(format!("Interval:    every {minutes} min"));
    }
    lines.join("\n")
}

pub async fn handle(dashboard: &Dashboard, global: &GlobalOpts) -> Result<(), CliError> {
    let schedule = dashboard.schedule();
    schedule.refresh().await?;
    let state = schedule.snapshot();
    let current = state.data.as_deref().cloned().unwrap_or_default();
    let out = output::render_single(&global.output, &current, detail, |s| {
        s.next_check
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn relative_times_read_naturally() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).single();
        let Some(now) = now else {
            panic!("valid timestamp");
        };
        assert_eq!(relative(now + chrono::Duration::seconds(250), now), "in 4m 10s");
        assert_eq!(relative(now - chrono::Duration::minutes(12), now), "12m ago");
    }

    #[test]
    fn missing_times_are_never() {
        assert!(detail(&Schedule::default()).contains("Last check:  never"));
    }
}
