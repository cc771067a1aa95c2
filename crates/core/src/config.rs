use std::env;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub metadata: MetadataConfig,
    pub cipher: CipherConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `DAYABASE_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("DAYABASE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let storage = StorageConfig::from_env_profiled(p);
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            metadata: MetadataConfig::from_env_profiled(p, &storage),
            storage,
            cipher: CipherConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:    {}:{}", self.server.host, self.server.port);
        tracing::info!("  storage:   data_dir={}", self.storage.data_dir.display());
        tracing::info!(
            "  metadata:  url={}, max_connections={}",
            self.metadata.database_url,
            self.metadata.max_connections
        );
        tracing::info!(
            "  cipher:    ENCRYPTION_KEY={}, IV={}",
            set_or_unset(&self.cipher.encryption_key),
            set_or_unset(&self.cipher.iv)
        );
    }
}

fn set_or_unset(value: &Option<String>) -> &'static str {
    if value.is_some() { "set" } else { "unset" }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 4000),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
        }
    }
}

// ── Metadata store (connections, questions, dashboards) ───────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl MetadataConfig {
    fn from_env_profiled(p: &str, storage: &StorageConfig) -> Self {
        let default_url = Self::default_url(storage);
        Self {
            database_url: profiled_env_or(p, "APP_DATABASE_URL", &default_url),
            max_connections: profiled_env_u32(p, "APP_DB_MAX_CONNECTIONS", 5),
        }
    }

    /// `sqlite://{data_dir}/dayabase.db`
    pub fn default_url(storage: &StorageConfig) -> String {
        format!("sqlite://{}", storage.data_dir.join("dayabase.db").display())
    }
}

// ── Credential cipher key material ────────────────────────────

/// Raw `ENCRYPTION_KEY` / `IV` values. Lengths are checked by
/// [`CredentialCipher::from_config`](crate::CredentialCipher::from_config).
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CipherConfig {
    #[serde(skip_serializing)]
    pub encryption_key: Option<String>,
    #[serde(skip_serializing)]
    pub iv: Option<String>,
}

impl CipherConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            encryption_key: profiled_env_opt(p, "ENCRYPTION_KEY"),
            iv: profiled_env_opt(p, "IV"),
        }
    }
}

impl fmt::Debug for CipherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherConfig")
            .field("encryption_key", &set_or_unset(&self.encryption_key))
            .field("iv", &set_or_unset(&self.iv))
            .finish()
    }
}
