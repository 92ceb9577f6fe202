use super::Wiring;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};
use crate::utils::mins2readable;
use chrono::Local;

pub async fn handle(cfg: &Config) -> AppResult<()> {
    let wiring = Wiring::from_config(cfg)?;
    let engine = wiring.engine(cfg)?;

    let outcome = engine.check_out().await;
    engine.shutdown();
    let outcome = outcome?;

    let id = outcome.session.id.as_deref().unwrap_or("-");
    let worked = mins2readable(outcome.duration_minutes, false, false);
    wiring.record(
        "check_out",
        id,
        &format!("Checked out after {} min", outcome.duration_minutes),
    );

    if outcome.anomalous {
        warning("The system clock is behind the check-in time; the duration was recorded as 0");
    }
    let at = outcome
        .session
        .check_out
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    success(format!("Checked out at {} after {} (session {})", at, worked, id));
    Ok(())
}
