// ABOUTME: Environment-based configuration loaded once at process startup
// ABOUTME: Provider credentials, usage limits, database URL, and dispatch tuning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Configuration Management
//!
//! Environment-only configuration, loaded once at startup. A missing
//! provider credential silently disables that provider's registry entry
//! rather than erroring; everything else has development-friendly defaults.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Default per-provider call deadline in seconds
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Default free-tier daily request limit
const DEFAULT_DAILY_LIMIT: i64 = 50;

/// Default free-tier monthly request limit
const DEFAULT_MONTHLY_LIMIT: i64 = 1000;

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database: DatabaseConfig,
    pub providers: ProviderConfig,
    pub usage: UsageConfig,
    pub dispatch: DispatchConfig,
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL
    pub url: String,
}

/// AI provider credentials
///
/// `None` means the provider is unconfigured: its fallback-chain entries
/// are skipped at dispatch time, not treated as failures.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
}

impl ProviderConfig {
    /// Whether at least one provider credential is present
    #[must_use]
    pub const fn any_configured(&self) -> bool {
        self.gemini_api_key.is_some() || self.groq_api_key.is_some()
    }
}

/// Rolling usage quota limits
#[derive(Debug, Clone, Copy)]
pub struct UsageConfig {
    /// Maximum requests in any trailing 24 hours
    pub daily_limit: i64,
    /// Maximum requests in any trailing 30 days
    pub monthly_limit: i64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT,
            monthly_limit: DEFAULT_MONTHLY_LIMIT,
        }
    }
}

/// Fallback dispatch tuning
#[derive(Debug, Clone, Copy)]
pub struct DispatchConfig {
    /// Deadline for a single provider attempt; a timed-out attempt counts
    /// as a failure and the chain continues
    pub call_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a present numeric variable fails to parse.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:./data/wingmate.db".into()),
            },
            providers: ProviderConfig {
                gemini_api_key: env_credential("GEMINI_API_KEY"),
                groq_api_key: env_credential("GROQ_API_KEY"),
            },
            usage: UsageConfig {
                daily_limit: env_parse("FREE_TIER_DAILY_LIMIT", DEFAULT_DAILY_LIMIT)?,
                monthly_limit: env_parse("FREE_TIER_MONTHLY_LIMIT", DEFAULT_MONTHLY_LIMIT)?,
            },
            dispatch: DispatchConfig {
                call_timeout: Duration::from_secs(env_parse(
                    "PROVIDER_CALL_TIMEOUT_SECS",
                    DEFAULT_CALL_TIMEOUT_SECS,
                )?),
            },
        })
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error when a limit is non-positive or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.usage.daily_limit > 0,
            "FREE_TIER_DAILY_LIMIT must be positive"
        );
        anyhow::ensure!(
            self.usage.monthly_limit > 0,
            "FREE_TIER_MONTHLY_LIMIT must be positive"
        );
        anyhow::ensure!(
            !self.dispatch.call_timeout.is_zero(),
            "PROVIDER_CALL_TIMEOUT_SECS must be positive"
        );
        Ok(())
    }

    /// One-line startup summary, safe to log (no secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "database={} gemini={} groq={} daily_limit={} monthly_limit={} call_timeout={}s",
            self.database.url,
            self.providers.gemini_api_key.is_some(),
            self.providers.groq_api_key.is_some(),
            self.usage.daily_limit,
            self.usage.monthly_limit,
            self.dispatch.call_timeout.as_secs(),
        )
    }
}

/// Read a credential, treating empty and placeholder values as absent
fn env_credential(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty() && !v.starts_with("your-"))
}

/// Parse an env var with a default when unset
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_validate() {
        let config = ServerConfig {
            database: DatabaseConfig {
                url: "sqlite::memory:".into(),
            },
            providers: ProviderConfig::default(),
            usage: UsageConfig::default(),
            dispatch: DispatchConfig::default(),
        };
        config.validate().unwrap();
        assert!(!config.providers.any_configured());
        assert!(config.summary().contains("daily_limit=50"));
    }

    #[test]
    fn zero_limits_rejected() {
        let config = ServerConfig {
            database: DatabaseConfig {
                url: "sqlite::memory:".into(),
            },
            providers: ProviderConfig::default(),
            usage: UsageConfig {
                daily_limit: 0,
                monthly_limit: 1000,
            },
            dispatch: DispatchConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}
