use super::Wiring;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::presence::{PresenceFilter, PresenceOrder, aggregate};
use crate::errors::{AppError, AppResult};
use crate::models::presence::PresenceInput;
use crate::ui::messages::warning;
use crate::utils::colors::{RESET, color_for_presence};
use crate::utils::formatting::bold;
use crate::utils::table::{Column, Table};
use chrono::Local;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Presence { filter, sort } = cmd else {
        return Ok(());
    };

    let filter = PresenceFilter::parse(filter).ok_or_else(|| {
        AppError::Other(format!(
            "unknown filter '{}': use all, present, break or absent",
            filter
        ))
    })?;
    let order = match sort.as_deref() {
        None => None,
        Some("user") => Some(PresenceOrder::UserId),
        Some("elapsed") => Some(PresenceOrder::LongestElapsed),
        Some(other) => {
            return Err(AppError::Other(format!(
                "unknown sort '{}': use user or elapsed",
                other
            )));
        }
    };

    if cfg.team.is_empty() {
        warning("No team configured: add user ids under `team` in the config file");
        return Ok(());
    }

    let wiring = Wiring::from_config(cfg)?;
    let now = wiring.reconciler.time().now();
    let today = now.date_naive();

    let inputs: Vec<PresenceInput> = wiring
        .reconciler
        .team_sessions(&cfg.team)
        .await?
        .into_iter()
        .map(|(uid, session)| PresenceInput::from_session(uid, session, today))
        .collect();
    let report = aggregate(&inputs, now);

    let counts = report.counts();
    println!(
        "👥 {}  ({} on break, {} absent)\n",
        bold(&report.headline()),
        counts.on_break,
        counts.absent
    );

    let rows = match order {
        Some(o) => report.sorted(filter, o),
        None => report.filter(filter),
    };

    let mut table = Table::new(vec![
        Column::new("USER", 12),
        Column::new("STATUS", 8),
        Column::new("SINCE", 8),
        Column::new("ELAPSED", 8),
    ]);
    for e in rows {
        table.add_row(vec![
            e.user_id.clone(),
            format!("{}{}{}", color_for_presence(e.status), e.status.label(), RESET),
            e.since
                .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
                .unwrap_or_else(|| "--:--".to_string()),
            e.elapsed_display.clone(),
        ]);
    }
    print!("{}", table.render());
    Ok(())
}
