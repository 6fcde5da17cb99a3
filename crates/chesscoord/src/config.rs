//! Process configuration, read from the environment (§6 "Configuration").

use std::path::PathBuf;

/// `NODE_ENV` ∈ {development, production, test}. Gates the dev-only clock
/// whitelist entry and increases protocol-violation log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_env_str(s: &str) -> Environment {
        match s {
            "development" => Environment::Development,
            "test" => Environment::Test,
            _ => Environment::Production,
        }
    }

    /// Whether dev-only conveniences (the `"15+2"` clock whitelist entry)
    /// are enabled.
    pub fn allow_dev_controls(self) -> bool {
        !matches!(self, Environment::Production)
    }
}

/// Everything the coordinator binary needs at startup, all read once.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub bind_addr: String,
    pub stats_path: PathBuf,
    pub allow_invites_path: PathBuf,
    pub archive_log_path: PathBuf,
}

impl AppConfig {
    /// Reads configuration from the environment, falling back to the
    /// spec's defaults (CWD-relative paths, `production` when unset).
    pub fn from_env() -> Self {
        let environment = std::env::var("NODE_ENV")
            .map(|v| Environment::from_env_str(&v))
            .unwrap_or(Environment::Production);
        let bind_addr = std::env::var("CHESSCOORD_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        Self {
            environment,
            bind_addr,
            stats_path: PathBuf::from("database/stats.json"),
            allow_invites_path: PathBuf::from("database/allowinvites.json"),
            archive_log_path: PathBuf::from("database/games.log"),
        }
    }
}
