// src/config/mod.rs
// Central configuration for the sync server

pub mod helpers;
pub mod server;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

lazy_static! {
    pub static ref CONFIG: SyncConfig = SyncConfig::from_env();
}

/// Main configuration structure - composes all domain configs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub server: server::ServerConfig,
    pub database: server::DatabaseConfig,
    pub logging: server::LoggingConfig,
    pub crypto: server::CryptoConfig,
    pub auth: server::AuthConfig,
    pub recycle_bin: server::RecycleBinConfig,
    pub pull: server::PullConfig,
}

impl SyncConfig {
    pub fn from_env() -> Self {
        // Load .env file if present; don't panic in production where it's absent.
        dotenvy::dotenv().ok();

        Self {
            server: server::ServerConfig::from_env(),
            database: server::DatabaseConfig::from_env(),
            logging: server::LoggingConfig::from_env(),
            crypto: server::CryptoConfig::from_env(),
            auth: server::AuthConfig::from_env(),
            recycle_bin: server::RecycleBinConfig::from_env(),
            pull: server::PullConfig::from_env(),
        }
    }

    pub fn bind_address(&self) -> String {
        self.server.bind_address()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
