//! Runtime configuration.
//!
//! Resolved once at startup and passed into the application state; request
//! handling never reads process-wide environment variables.

use std::env;
use std::path::PathBuf;

/// Application configuration resolved from the environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the REST server binds to (`VAULT_ADDR`).
    pub bind_addr: String,
    /// Storage root for the local backend (`VAULT_DATA_DIR`).
    pub data_dir: PathBuf,
    /// Optional shared API key checked on every request (`API_KEY`).
    ///
    /// When unset, requests are trusted to arrive through an upstream
    /// gateway that already verified them.
    pub api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("VAULT_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            data_dir: env::var("VAULT_DATA_DIR")
                .unwrap_or_else(|_| "vault_data".into())
                .into(),
            api_key: env::var("API_KEY").ok().filter(|key| !key.trim().is_empty()),
        }
    }
}
