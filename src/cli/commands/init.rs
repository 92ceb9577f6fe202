use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::log;
use crate::db::pool::DbPool;
use crate::errors::AppResult;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file (skipped in test mode)
///  - the SQLite database and its pending migrations
pub fn handle(cli: &Cli) -> AppResult<()> {
    let mut cfg = Config::init_all(cli.db.clone(), cli.test)?;
    if let Some(api) = &cli.api {
        cfg.api_base_url = api.clone();
    }
    let db_path = cfg.database_path();

    println!("⚙️  Initializing rAttendance…");
    println!("📄 Config file : {}", Config::config_file().display());
    println!("🗄️  Database   : {}", db_path.display());
    println!("🌐 Backend    : {}", cfg.api_base_url);

    let pool = DbPool::open(&db_path)?;
    println!("✅ Database initialized at {}", db_path.display());

    if let Err(e) = log::ttlog(
        &pool.conn,
        "init",
        "Database initialized",
        &format!("Database initialized at {}", db_path.display()),
    ) {
        eprintln!("⚠️ Failed to write internal log: {}", e);
    }

    if cfg.user_id.is_empty() {
        println!("👤 No user configured yet: set `user_id` in the config file or pass --user");
    }
    println!("🎉 rAttendance initialization completed!");
    Ok(())
}
