//! Process configuration, assembled once at startup and passed down by
//! value. Nothing here is read again after boot.

use std::env;

use crate::token::DEFAULT_TTL_SECS;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub db_path: String,
    /// Signing secret for bearer tokens. Never logged.
    pub secret_key: String,
    pub token_ttl_secs: i64,
}

impl Config {
    /// Reads `TASKNOTE_*` environment variables, falling back to development
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let http_port = env::var("TASKNOTE_HTTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000);
        let db_path = env::var("TASKNOTE_DB_PATH")
            .unwrap_or_else(|_| "database/tasknote.db".to_string());
        let secret_key =
            env::var("TASKNOTE_SECRET_KEY").unwrap_or_else(|_| "your_secret_key".to_string());
        let token_ttl_secs = env::var("TASKNOTE_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECS);

        Self { http_port, db_path, secret_key, token_ttl_secs }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 5000,
            db_path: "database/tasknote.db".to_string(),
            secret_key: "your_secret_key".to_string(),
            token_ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}
