//! # Configuration
//!
//! Loaded from an optional YAML file, then overridden from the environment:
//!
//! | Variable              | Overrides         |
//! |-----------------------|-------------------|
//! | `PORT`                | `server.port`     |
//! | `TOLLGATE_CLIENT_ID`  | `auth.clientId`   |
//! | `TOLLGATE_SECRET`     | `auth.secret`     |
//! | `TOLLGATE_TOKEN_TTL`  | `auth.tokenTtl`   |
//! | `TOLLGATE_STORE_PATH` | `store.path`      |
//!
//! Validation happens when the config is converted into runtime values by
//! [`AppConfig::credential`], [`AppConfig::token_ttl`], and
//! [`AppConfig::gate_policy`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tollgate_core::{ClientCredential, CoreError, TokenTtl};
use tollgate_store::StoreOptions;

use crate::gate::GatePolicy;

/// Configuration loading or validation failure.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },

    /// A value was rejected by the domain types.
    #[error("invalid auth settings: {0}")]
    Core(#[from] CoreError),

    /// A value failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub gate: GateSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// The trusted client credential and token lifetime.
///
/// Custom `Debug` redacts the secret to prevent credential leakage in logs.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuthSettings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            secret: String::new(),
            token_ttl: default_token_ttl(),
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("client_id", &self.client_id)
            .field("secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

/// Which paths the gate handles.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GateSettings {
    #[serde(default = "default_token_path")]
    pub token_path: String,
    #[serde(default = "default_protected_prefix")]
    pub protected_prefix: String,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
            protected_prefix: default_protected_prefix(),
        }
    }
}

/// Token store settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StoreSettings {
    /// Storage directory. `None` keeps tokens in memory only.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_store_timeout_ms")]
    pub timeout_ms: u64,
    /// Interval between expiry sweeps. `None` disables sweeping.
    #[serde(default)]
    pub sweep_interval_secs: Option<u64>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: None,
            timeout_ms: default_store_timeout_ms(),
            sweep_interval_secs: None,
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_token_ttl() -> u64 {
    1800
}

fn default_token_path() -> String {
    "/token".to_string()
}

fn default_protected_prefix() -> String {
    "/api".to_string()
}

fn default_store_timeout_ms() -> u64 {
    5000
}

impl AppConfig {
    /// Load from `path` (if given) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_yaml(&text)?
            }
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Parse a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("PORT") {
            self.server.port = value.parse().map_err(|_| ConfigError::Env {
                var: "PORT",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("TOLLGATE_CLIENT_ID") {
            self.auth.client_id = value;
        }
        if let Some(value) = lookup("TOLLGATE_SECRET") {
            self.auth.secret = value;
        }
        if let Some(value) = lookup("TOLLGATE_TOKEN_TTL") {
            self.auth.token_ttl = value.parse().map_err(|_| ConfigError::Env {
                var: "TOLLGATE_TOKEN_TTL",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("TOLLGATE_STORE_PATH") {
            self.store.path = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// The trusted client credential.
    pub fn credential(&self) -> Result<ClientCredential, ConfigError> {
        Ok(ClientCredential::new(
            self.auth.client_id.clone(),
            self.auth.secret.clone(),
        )?)
    }

    /// The configured token lifetime.
    pub fn token_ttl(&self) -> Result<TokenTtl, ConfigError> {
        Ok(TokenTtl::from_secs(self.auth.token_ttl)?)
    }

    /// Routing policy for the gate.
    pub fn gate_policy(&self) -> Result<GatePolicy, ConfigError> {
        for (name, value) in [
            ("gate.tokenPath", &self.gate.token_path),
            ("gate.protectedPrefix", &self.gate.protected_prefix),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{name} must start with '/', got {value:?}"
                )));
            }
        }
        Ok(GatePolicy::with_prefix(
            self.gate.token_path.clone(),
            self.gate.protected_prefix.clone(),
        ))
    }

    /// Options for the token store.
    pub fn store_options(&self) -> Result<StoreOptions, ConfigError> {
        if self.store.timeout_ms == 0 {
            return Err(ConfigError::Invalid("store.timeoutMs must be positive".into()));
        }
        Ok(StoreOptions {
            timeout: Duration::from_millis(self.store.timeout_ms),
            ..StoreOptions::default()
        })
    }

    /// Sweep interval, if sweeping is enabled.
    pub fn sweep_interval(&self) -> Result<Option<Duration>, ConfigError> {
        match self.store.sweep_interval_secs {
            Some(0) => Err(ConfigError::Invalid(
                "store.sweepIntervalSecs must be positive".into(),
            )),
            Some(secs) => Ok(Some(Duration::from_secs(secs))),
            None => Ok(None),
        }
    }
}
