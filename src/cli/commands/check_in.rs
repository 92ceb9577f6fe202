use super::Wiring;
use crate::config::Config;
use crate::core::engine::{CheckInOutcome, EngineState};
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};
use chrono::{DateTime, Local, Utc};

fn already(started_at: DateTime<Utc>) {
    info(format!(
        "Already checked in since {}",
        started_at.with_timezone(&Local).format("%H:%M:%S")
    ));
}

pub async fn handle(cfg: &Config) -> AppResult<()> {
    let wiring = Wiring::from_config(cfg)?;
    let engine = wiring.engine(cfg)?;

    // No network round trip when the local snapshot already says so.
    if let EngineState::CheckedIn { started_at, .. } = engine.state() {
        already(started_at);
        return Ok(());
    }

    let user = wiring.reconciler.resolve_user(engine.user_id()).await?;
    let outcome = engine.check_in_or_resume().await;
    engine.shutdown();

    let outcome = match outcome {
        Ok(o) => o,
        Err(e) => {
            if engine.is_checked_in() {
                // Opened on the server but not saved here.
                warning("The session was opened on the server but could not be saved locally; run `rattendance status --sync`");
            }
            return Err(e);
        }
    };

    match outcome {
        CheckInOutcome::CheckedIn(session) => {
            let id = session.id.as_deref().unwrap_or("-");
            wiring.record(
                "check_in",
                id,
                &format!(
                    "{} checked in at {}",
                    user.display_name(),
                    session.check_in.to_rfc3339()
                ),
            );
            success(format!(
                "{} checked in at {} (session {})",
                user.display_name(),
                session.check_in.with_timezone(&Local).format("%H:%M:%S"),
                id
            ));
        }
        CheckInOutcome::Resumed(session) => {
            let id = session.id.as_deref().unwrap_or("-");
            wiring.record("adopt", id, "Resumed open session found on the server");
            info(format!(
                "Resumed the open session {} started at {}",
                id,
                session.check_in.with_timezone(&Local).format("%H:%M:%S")
            ));
        }
        CheckInOutcome::AlreadyCheckedIn { started_at } => already(started_at),
    }
    Ok(())
}
