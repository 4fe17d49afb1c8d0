// src/config/server.rs
// Server, database, and crypto configuration

use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: super::helpers::env_or("SYNC_HOST", "0.0.0.0"),
            port: super::helpers::env_usize("SYNC_PORT", 8000) as u16,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: super::helpers::env_or("DATABASE_URL", "sqlite://data/sync.db?mode=rwc"),
            max_connections: super::helpers::env_usize("SYNC_SQLITE_MAX_CONNECTIONS", 10) as u32,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            level: super::helpers::env_or("SYNC_LOG_LEVEL", "info"),
        }
    }
}

/// Envelope crypto configuration (C7)
#[derive(Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Base64-encoded 32-byte root key (KEK).
    pub kek_b64: String,
}

impl std::fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("kek_b64", &"<redacted>")
            .finish()
    }
}

impl CryptoConfig {
    pub fn from_env() -> Self {
        Self {
            kek_b64: super::helpers::require_env("ENCRYPTION_KEK"),
        }
    }
}

/// Bearer-token verification configuration. Issuance is a collaborator's
/// job; this core only verifies signatures against the shared key.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_signing_key: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_signing_key", &"<redacted>")
            .finish()
    }
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            jwt_signing_key: super::helpers::require_env("JWT_SECRET"),
        }
    }
}

/// Recycle-bin / reaper configuration (C6)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecycleBinConfig {
    pub window_days: i64,
    pub admin_purge_key: String,
    pub operation_retention_days: i64,
}

impl RecycleBinConfig {
    pub fn from_env() -> Self {
        Self {
            window_days: super::helpers::env_usize("SYNC_RECYCLE_WINDOW_DAYS", 7) as i64,
            admin_purge_key: super::helpers::require_env("ADMIN_PURGE_KEY"),
            operation_retention_days: super::helpers::env_usize(
                "SYNC_OPERATION_RETENTION_DAYS",
                30,
            ) as i64,
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_days * 24 * 60 * 60 * 1000
    }
}

/// Pull-pagination configuration (C3)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl PullConfig {
    pub fn from_env() -> Self {
        Self {
            default_limit: super::helpers::env_usize("PULL_DEFAULT_LIMIT", 500) as i64,
            max_limit: super::helpers::env_usize("PULL_MAX_LIMIT", 2000) as i64,
        }
    }
}
