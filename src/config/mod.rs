use crate::core::clock::DEFAULT_TICK;
use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Local SQLite file holding the session snapshot and the internal log
    pub database: String,
    /// Base URL of the time-entry backend, e.g. `http://localhost:3000/api`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Acting user id
    #[serde(default)]
    pub user_id: String,
    /// Roster shown by `presence`, in display order
    #[serde(default)]
    pub team: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_daily_target")]
    pub daily_target_minutes: i64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_api_base_url() -> String {
    "http://localhost:3000/api".to_string()
}
fn default_request_timeout() -> u64 {
    10
}
fn default_tick_interval() -> u64 {
    DEFAULT_TICK.as_millis() as u64
}
fn default_daily_target() -> i64 {
    480
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        let db_path = Self::database_file();
        Self {
            database: db_path.to_string_lossy().to_string(),
            api_base_url: default_api_base_url(),
            user_id: String::new(),
            team: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            tick_interval_ms: default_tick_interval(),
            daily_target_minutes: default_daily_target(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rattendance")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".rattendance")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rattendance.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rattendance.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Self::from_yaml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        let cfg: Config = serde_yaml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> AppResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(AppError::Config("tick_interval_ms must be > 0".into()));
        }
        if self.daily_target_minutes < 0 {
            return Err(AppError::Config(
                "daily_target_minutes must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Database path with `~/` expanded.
    pub fn database_path(&self) -> PathBuf {
        expand_tilde(&self.database)
    }

    /// The acting user, which every session operation needs.
    pub fn require_user(&self) -> AppResult<&str> {
        if self.user_id.trim().is_empty() {
            return Err(AppError::Config(
                "no user configured: set `user_id` in the config file or pass --user".into(),
            ));
        }
        Ok(self.user_id.trim())
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_db {
            let p = std::path::Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p)
            }
        } else {
            Self::database_file()
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Self::default()
        };

        // Write config file
        if !is_test {
            let yaml = serde_yaml::to_string(&config)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_keys_take_defaults() {
        let cfg = Config::from_yaml("database: /tmp/x.sqlite\nuser_id: '3'\n").unwrap();
        assert_eq!(cfg.tick_interval_ms, 1000);
        assert_eq!(cfg.daily_target_minutes, 480);
        assert_eq!(cfg.require_user().unwrap(), "3");
        assert!(cfg.team.is_empty());
    }

    #[test]
    fn zero_tick_interval_is_rejected() {
        let err = Config::from_yaml("database: x\ntick_interval_ms: 0\n").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn missing_user_is_a_config_error() {
        let cfg = Config::from_yaml("database: x\n").unwrap();
        assert!(cfg.require_user().is_err());
    }
}
