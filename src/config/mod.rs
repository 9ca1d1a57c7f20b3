//! Layered configuration for the kscdb facade.
//!
//! Precedence (highest to lowest):
//! - `KSCDB_*` environment variables
//! - File named by `KSCDB_CONFIG_FILE`
//! - `./kscdb.toml`
//! - Built-in defaults
//!
//! ```toml
//! [lock]
//! acquire_timeout_ms = 5000
//! lease_ttl_ms = 30000
//!
//! [lock.backoff]
//! initial_backoff_ms = 2
//! max_backoff_ms = 250
//!
//! [ids]
//! start_value = 1
//!
//! [queue]
//! max_claim_attempts = 8
//! scan_batch_size = 100
//! ```

mod error;

use std::path::Path;
use std::str::FromStr;

pub use error::ConfigError;
use kscdb_constants::api::MAX_SCAN_RESULTS;
use kscdb_constants::coordination::MAX_LOCK_BACKOFF_MS;
use kscdb_constants::coordination::MAX_QUEUE_CLAIM_ATTEMPTS;
use kscdb_coordination::IdConfig;
use kscdb_coordination::LockConfig;
use kscdb_coordination::QueueConfig;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

/// Environment variable naming an explicit config file.
pub const CONFIG_FILE_ENV: &str = "KSCDB_CONFIG_FILE";

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "./kscdb.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KscdbConfig {
    pub lock: LockConfig,
    pub ids: IdConfig,
    pub queue: QueueConfig,
}

impl KscdbConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path: display, source })
    }

    /// Load configuration with layered approach, then validate.
    pub fn load_with_layers() -> Result<Self, ConfigError> {
        let mut config = Self::load_toml_with_fallbacks()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn load_toml_with_fallbacks() -> Result<Self, ConfigError> {
        if let Ok(config_path) = std::env::var(CONFIG_FILE_ENV) {
            let path = Path::new(&config_path);
            if path.exists() {
                info!(path = %config_path, "loading configuration from {CONFIG_FILE_ENV}");
                return Self::from_toml_file(path);
            }
            warn!(path = %config_path, "{CONFIG_FILE_ENV} specified but not found");
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            info!(path = DEFAULT_CONFIG_FILE, "loading configuration");
            return Self::from_toml_file(local);
        }

        info!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Override fields from `KSCDB_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Override fields from an arbitrary variable source.
    ///
    /// An empty value clears an optional field.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where F: Fn(&str) -> Option<String> {
        macro_rules! apply_override {
            (optional $($field:ident).+, $env:literal) => {
                if let Some(raw) = lookup($env) {
                    self.$($field).+ = if raw.trim().is_empty() { None } else { Some(parse_env($env, &raw)?) };
                }
            };
            ($($field:ident).+, $env:literal) => {
                if let Some(raw) = lookup($env) {
                    self.$($field).+ = parse_env($env, &raw)?;
                }
            };
        }

        apply_override!(lock.backoff.initial_backoff_ms, "KSCDB_LOCK_INITIAL_BACKOFF_MS");
        apply_override!(lock.backoff.max_backoff_ms, "KSCDB_LOCK_MAX_BACKOFF_MS");
        apply_override!(optional lock.acquire_timeout_ms, "KSCDB_LOCK_ACQUIRE_TIMEOUT_MS");
        apply_override!(optional lock.lease_ttl_ms, "KSCDB_LOCK_LEASE_TTL_MS");
        apply_override!(ids.start_value, "KSCDB_IDS_START_VALUE");
        apply_override!(queue.max_claim_attempts, "KSCDB_QUEUE_MAX_CLAIM_ATTEMPTS");
        apply_override!(queue.scan_batch_size, "KSCDB_QUEUE_SCAN_BATCH_SIZE");

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let backoff = &self.lock.backoff;
        if backoff.initial_backoff_ms == 0 {
            return Err(ConfigError::invalid("lock.backoff.initial_backoff_ms", 0, "must be positive"));
        }
        if backoff.initial_backoff_ms > backoff.max_backoff_ms {
            return Err(ConfigError::invalid(
                "lock.backoff.initial_backoff_ms",
                backoff.initial_backoff_ms,
                format!("exceeds max_backoff_ms {}", backoff.max_backoff_ms),
            ));
        }
        if backoff.max_backoff_ms > MAX_LOCK_BACKOFF_MS {
            return Err(ConfigError::invalid(
                "lock.backoff.max_backoff_ms",
                backoff.max_backoff_ms,
                format!("must be at most {MAX_LOCK_BACKOFF_MS}"),
            ));
        }
        if self.lock.lease_ttl_ms == Some(0) {
            return Err(ConfigError::invalid("lock.lease_ttl_ms", 0, "must be positive when set"));
        }
        if self.lock.acquire_timeout_ms == Some(0) {
            return Err(ConfigError::invalid("lock.acquire_timeout_ms", 0, "must be positive when set"));
        }

        let attempts = self.queue.max_claim_attempts;
        if attempts == 0 || attempts > MAX_QUEUE_CLAIM_ATTEMPTS {
            return Err(ConfigError::invalid(
                "queue.max_claim_attempts",
                attempts,
                format!("must be in 1..={MAX_QUEUE_CLAIM_ATTEMPTS}"),
            ));
        }
        let batch = self.queue.scan_batch_size;
        if batch == 0 || batch > MAX_SCAN_RESULTS {
            return Err(ConfigError::invalid(
                "queue.scan_batch_size",
                batch,
                format!("must be in 1..={MAX_SCAN_RESULTS}"),
            ));
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid("config", "", format!("failed to serialize: {e}")))
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where T::Err: std::fmt::Display {
    raw.trim().parse().map_err(|e: T::Err| ConfigError::invalid(key, raw, e.to_string()))
}
