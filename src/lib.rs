//! rAttendance library root.
//! Exposes the CLI parser, the high-level run() function and the session
//! engine, store, reconciler and presence modules for library use.

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use tracing_subscriber::EnvFilter;

/// Central command dispatcher
pub async fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Status { .. } => cli::commands::status::handle(&cli.command, cfg).await,
        Commands::CheckIn => cli::commands::check_in::handle(cfg).await,
        Commands::CheckOut => cli::commands::check_out::handle(cfg).await,
        Commands::Watch { .. } => cli::commands::watch::handle(&cli.command, cfg).await,
        Commands::Presence { .. } => cli::commands::presence::handle(&cli.command, cfg).await,
        Commands::Summary { .. } => cli::commands::summary::handle(&cli.command, cfg).await,
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
    }
}

/// `RUST_LOG` wins over the configured level. Diagnostics go to stderr so
/// they never mix with command output.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // `init` must work even when the existing config file is broken.
    let mut cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) if matches!(cli.command, Commands::Init) => {
            eprintln!("⚠️ Ignoring unreadable configuration: {}", e);
            Config::default()
        }
        Err(e) => return Err(e),
    };

    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }
    if let Some(api) = &cli.api {
        cfg.api_base_url = api.clone();
    }
    if let Some(user) = &cli.user {
        cfg.user_id = user.clone();
    }

    init_tracing(&cfg.log_level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(&cli, &cfg))
}
