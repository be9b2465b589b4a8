use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Point accrual service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "pointr")]
#[command(about = "Loyalty point accrual service")]
pub struct Config {
    /// HTTP server listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "POINTR_LISTEN_ADDR")]
    pub listen_addr: String,

    /// PostgreSQL connection URL (in-memory storage if not set)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Minimum pooled database connections
    #[arg(long, default_value = "1", env = "POINTR_DB_MIN_CONNECTIONS")]
    pub db_min_connections: u32,

    /// Maximum pooled database connections
    #[arg(long, default_value = "10", env = "POINTR_DB_MAX_CONNECTIONS")]
    pub db_max_connections: u32,

    /// Rule catalog YAML used to seed in-memory storage
    #[arg(long, default_value = "rules.yaml", env = "POINTR_RULES_PATH")]
    pub rules_path: PathBuf,

    /// Export file path template; `{date}` becomes YYYY-MM-DD
    #[arg(
        long,
        default_value = "exports/point-summary_{date}.csv",
        env = "POINTR_EXPORT_PATH"
    )]
    pub export_path: String,

    /// Maximum accepted upload body size in bytes
    #[arg(long, default_value = "33554432", env = "POINTR_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, default_value = "false", env = "POINTR_LOG_JSON")]
    pub log_json: bool,

    /// Enable graceful shutdown
    #[arg(long, default_value = "true", env = "POINTR_GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: bool,

    /// Graceful shutdown timeout in seconds
    #[arg(long, default_value = "30", env = "POINTR_SHUTDOWN_TIMEOUT_SECS")]
    pub shutdown_timeout_secs: u64,
}

impl Config {
    /// Get shutdown timeout as Duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Whether a database is configured.
    pub fn uses_database(&self) -> bool {
        self.database_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            db_min_connections: 1,
            db_max_connections: 10,
            rules_path: PathBuf::from("rules.yaml"),
            export_path: "exports/point-summary_{date}.csv".to_string(),
            max_upload_bytes: 32 * 1024 * 1024,
            log_level: "info".to_string(),
            log_json: false,
            graceful_shutdown: true,
            shutdown_timeout_secs: 30,
        }
    }
}
