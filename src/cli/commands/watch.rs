use super::Wiring;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::info;
use std::io::Write;
use std::time::Duration;

/// Repaint the elapsed counter on every clock tick until Ctrl-C.
pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let seconds = match cmd {
        Commands::Watch { seconds } => *seconds,
        _ => None,
    };

    let wiring = Wiring::from_config(cfg)?;
    let engine = wiring.engine(cfg)?;
    if !engine.is_checked_in() {
        info("Not checked in: nothing to watch");
        return Ok(());
    }

    let mut rx = engine.subscribe();
    let deadline = async {
        match seconds {
            Some(s) => tokio::time::sleep(Duration::from_secs(s)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut out = std::io::stdout();
    loop {
        let current = rx.borrow_and_update().clone();
        print!("\r⏱  {} ", current);
        out.flush()?;

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut deadline => break,
        }
    }
    println!();

    engine.shutdown();
    Ok(())
}
