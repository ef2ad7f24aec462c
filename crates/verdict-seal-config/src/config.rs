// verdict-seal-config/src/config.rs
// ============================================================================
// Module: Verdict Seal Configuration
// Description: Configuration loading and validation for Verdict Seal.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, verdict-seal-core
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with a size limit and explicit
//! validation. Missing sections fall back to documented defaults; invalid
//! values fail closed. The default policy id must resolve in the enumerated
//! policy registry at load time, not at first request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use verdict_seal_core::Policy;
use verdict_seal_core::PolicyId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "verdict-seal.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "VERDICT_SEAL_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Default bind host for the HTTP surface.
const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port for the HTTP surface.
const DEFAULT_PORT: u16 = 5000;
/// Default artifact root, relative to the working directory.
const DEFAULT_ARTIFACT_ROOT: &str = "artifacts";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("config io error: {0}")]
    Io(String),
    /// The config file is not valid TOML for the expected model.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A config value failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Artifact store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ArtifactsConfig {
    /// Artifact root directory; created on startup when absent.
    pub root: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ARTIFACT_ROOT),
        }
    }
}

/// Policy selection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PolicyConfig {
    /// Policy id applied to fresh evaluations.
    pub default_policy_id: PolicyId,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_policy_id: PolicyId::new(verdict_seal_core::DEFAULT_POLICY_ID),
        }
    }
}

/// Root configuration for Verdict Seal services.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SealConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Artifact store settings.
    pub artifacts: ArtifactsConfig,
    /// Policy selection settings.
    pub policy: PolicyConfig,
}

impl SealConfig {
    /// Loads configuration from the given path, the `VERDICT_SEAL_CONFIG`
    /// environment variable, or the default filename; a missing default
    /// file yields the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when reading, parsing, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);
        let resolved = path
            .map(Path::to_path_buf)
            .or(env_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME));

        let explicit = path.is_some() || env::var(CONFIG_ENV_VAR).is_ok();
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when any value is out of bounds or
    /// the default policy id is not registered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::Invalid("server.host must be non-empty".to_string()));
        }
        if self.server.host != "localhost" && self.server.host.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server.host must be an IP address or 'localhost', got '{}'",
                self.server.host
            )));
        }
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".to_string()));
        }
        if self.artifacts.root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("artifacts.root must be non-empty".to_string()));
        }
        Policy::resolve(&self.policy.default_policy_id)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(())
    }
}
