//! Service configuration
//!
//! Stored as JSON. Every section and field is optional; anything missing
//! takes its default. A file that fails to parse is logged and replaced
//! by defaults, while a file that exists but cannot be read is an error.

use crate::error::{ServiceError, ServiceResult};
use placeholder::Grammar;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Comma separated API keys, replacing `auth.api_keys`
pub const ENV_API_KEYS: &str = "DOCGEN_API_KEYS";

/// Pool capacity, replacing `pool.capacity`
pub const ENV_POOL_CAPACITY: &str = "DOCGEN_POOL_CAPACITY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub pool: PoolConfig,
    pub placeholder: PlaceholderConfig,
    pub renderer: RendererConfig,
    pub rate_limit: RateLimitConfig,
    pub auth: AuthConfig,
    pub workspace: WorkspaceConfig,
    /// Deadline applied to calls whose caller set none
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum concurrent generation jobs
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { capacity: 5 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    pub grammar: Grammar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Replaces the platform's well-known install locations
    pub candidates: Option<Vec<PathBuf>>,
    /// Separate office profile per conversion
    pub isolated_profile: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            candidates: None,
            isolated_profile: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Steady-state requests per second
    pub per_second: f64,
    /// Requests allowed in a burst
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_second: 2.0,
            burst: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Accepted API keys; an empty list rejects every call
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory for temporary artifacts, the OS temp dir when unset
    pub root: Option<PathBuf>,
}

impl ServiceConfig {
    /// Load from `path`, falling back to defaults when it is absent or
    /// unparseable, then apply environment overrides and validate.
    pub fn load(path: &Path) -> ServiceResult<Self> {
        let config = Self::load_file(path)?.with_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file
    pub fn from_env() -> ServiceResult<Self> {
        let config = Self::default().with_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> ServiceResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        match serde_json::from_str::<ServiceConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Failed to parse config file, using defaults: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Apply overrides looked up through `var`
    pub fn with_env_overrides<F>(mut self, var: F) -> ServiceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(keys) = var(ENV_API_KEYS) {
            self.auth.api_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(capacity) = var(ENV_POOL_CAPACITY) {
            self.pool.capacity = capacity.trim().parse().map_err(|_| {
                ServiceError::Config(format!("{ENV_POOL_CAPACITY} must be a positive integer"))
            })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.pool.capacity == 0 {
            return Err(ServiceError::Config("pool.capacity must be at least 1".into()));
        }
        if self.rate_limit.enabled {
            let rate = self.rate_limit.per_second;
            if rate.is_nan() || rate <= 0.0 {
                return Err(ServiceError::Config("rate_limit.per_second must be positive".into()));
            }
            if self.rate_limit.burst == 0 {
                return Err(ServiceError::Config("rate_limit.burst must be at least 1".into()));
            }
        }
        if self.auth.api_keys.iter().any(|k| k.is_empty()) {
            return Err(ServiceError::Config("auth.api_keys must not contain blank keys".into()));
        }
        if self.auth.api_keys.is_empty() {
            tracing::warn!("no API keys configured; every call will be rejected");
        }
        Ok(())
    }
}
