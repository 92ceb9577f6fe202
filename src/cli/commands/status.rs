use super::Wiring;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::engine::{EngineState, SyncOutcome};
use crate::errors::AppResult;
use crate::ui::messages::{info, warning};
use crate::utils::{format_hms, mins2readable};
use chrono::Local;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let sync = matches!(cmd, Commands::Status { sync: true });

    let wiring = Wiring::from_config(cfg)?;
    let engine = wiring.engine(cfg)?;

    if sync {
        match engine.sync_with_remote().await? {
            SyncOutcome::Adopted(session) => {
                let id = session.id.as_deref().unwrap_or("-");
                wiring.record("adopt", id, "Resumed open session found on the server");
                info(format!("Resumed open session {} from the server", id));
            }
            SyncOutcome::ClosedRemotely(session) => {
                let id = session.id.as_deref().unwrap_or("-");
                let worked = mins2readable(session.duration_minutes.unwrap_or(0), false, false);
                wiring.record(
                    "check_out",
                    id,
                    &format!("Session already closed on the server after {}", worked),
                );
                warning(format!(
                    "Session {} was already closed on the server after {}; now checked out",
                    id, worked
                ));
            }
            SyncOutcome::Unchanged if !engine.is_checked_in() => {
                match wiring.reconciler.latest_for_user(engine.user_id()).await? {
                    Some(last) => info(format!(
                        "No open session on the server; last one ended {} after {}",
                        last.check_out
                            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        mins2readable(last.duration_minutes.unwrap_or(0), false, false)
                    )),
                    None => info("No sessions on the server yet"),
                }
            }
            SyncOutcome::Unchanged => {}
        }
    }

    match engine.state() {
        EngineState::CheckedIn {
            started_at,
            remote_id,
        } => {
            println!(
                "🟢 Checked in since {} (session {})",
                started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                remote_id
            );
            let elapsed = engine.elapsed();
            println!("⏱  Elapsed: {}", format_hms(elapsed));
            if elapsed.num_hours() >= 24 {
                warning("Session has been open for more than a day; did you forget to check out?");
            }
        }
        EngineState::CheckedOut => println!("⚪ Checked out"),
    }

    engine.shutdown();
    Ok(())
}
