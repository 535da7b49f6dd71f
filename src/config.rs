//! Configuration management for objstore-creds
//!
//! Supports configuration via:
//! - Environment variables (primary)
//! - Optional TOML config file (secondary)
//!
//! Environment variables take precedence over config file values. Secrets
//! are never read from the config file; credentials come from the standard
//! provider environment variables at resolve time.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::{CredentialsError, Result};
use crate::resolve::DEFAULT_SAS_PERMISSIONS;

/// Which credential the binary builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialKind {
    /// AWS keys (with environment defaults)
    Aws,
    /// Azure storage account key, resolved to a SAS token
    Azure,
    /// Azure service principal
    AzureServicePrincipal,
    /// GCP service-account key file
    Gcp,
    /// GCP application-default credentials
    GcpDefault,
}

impl FromStr for CredentialKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" | "s3" => Ok(CredentialKind::Aws),
            "azure" | "az" => Ok(CredentialKind::Azure),
            "azure-service-principal" | "azure-sp" => Ok(CredentialKind::AzureServicePrincipal),
            "gcp" | "gcs" | "gs" => Ok(CredentialKind::Gcp),
            "gcp-default" | "google-default" => Ok(CredentialKind::GcpDefault),
            _ => Err(format!("Unknown credential kind: {}", s)),
        }
    }
}

/// Resolution engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Seconds to skip GCP default discovery after a failure (default: 60)
    pub gcp_default_cooldown_secs: u64,

    /// Lifetime of derived Azure SAS tokens in seconds (default: 1 day)
    pub sas_ttl_secs: u64,

    /// Permission letters for derived Azure SAS tokens (default: racwdl)
    pub sas_permissions: String,

    /// Lifetime of exchanged AWS session tokens in seconds (default: 3600)
    pub session_token_duration_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            gcp_default_cooldown_secs: 60,
            sas_ttl_secs: 24 * 60 * 60,
            sas_permissions: DEFAULT_SAS_PERMISSIONS.to_string(),
            session_token_duration_secs: 3600,
        }
    }
}

/// Seconds as a `Duration`, rejecting counts chrono cannot represent.
fn seconds(field: &str, secs: u64) -> Result<Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| CredentialsError::configuration(format!("`{field}` out of range: {secs}s")))
}

fn positive_seconds(field: &str, secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(CredentialsError::configuration(format!(
            "`{field}` must be greater than zero"
        )));
    }
    seconds(field, secs)
}

impl ResolverConfig {
    /// Zero disables the cooldown.
    pub fn gcp_default_cooldown(&self) -> Result<Duration> {
        seconds("gcp_default_cooldown_secs", self.gcp_default_cooldown_secs)
    }

    pub fn sas_ttl(&self) -> Result<Duration> {
        positive_seconds("sas_ttl_secs", self.sas_ttl_secs)
    }

    pub fn session_token_duration(&self) -> Result<Duration> {
        positive_seconds("session_token_duration_secs", self.session_token_duration_secs)
    }
}

/// What the binary resolves and probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Credential kind to build
    pub kind: CredentialKind,

    /// Bucket URL to probe (s3://, az://, gs://, ...); translation only when unset
    #[serde(default)]
    pub bucket_url: Option<String>,

    /// AWS only: exchange keys for a session token before translating
    #[serde(default)]
    pub exchange_session_token: bool,

    /// GCP only: path to a service-account key file
    #[serde(default)]
    pub service_account_file: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            kind: CredentialKind::Aws,
            bucket_url: None,
            exchange_session_token: false,
            service_account_file: None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Resolution settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Probe settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            probe: ProbeConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| CredentialsError::configuration(format!("{name}: {e}")))
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - OBJSTORE_CREDS_CONFIG_FILE: optional path to TOML config file
    /// - OBJSTORE_CREDS_KIND: aws|azure|azure-service-principal|gcp|gcp-default
    /// - OBJSTORE_CREDS_BUCKET_URL: bucket URL to probe (optional)
    /// - OBJSTORE_CREDS_EXCHANGE_SESSION_TOKEN: true|false (default: false)
    /// - OBJSTORE_CREDS_SERVICE_ACCOUNT_FILE: GCP service-account key file
    /// - OBJSTORE_CREDS_GCP_DEFAULT_COOLDOWN_SECS: default: 60
    /// - OBJSTORE_CREDS_SAS_TTL_SECS: default: 86400
    /// - OBJSTORE_CREDS_SAS_PERMISSIONS: default: racwdl
    /// - OBJSTORE_CREDS_SESSION_TOKEN_DURATION_SECS: default: 3600
    /// - OBJSTORE_CREDS_LOG_LEVEL: log level (default: info)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an injected variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Try to load from config file first if specified
        let mut config = match lookup("OBJSTORE_CREDS_CONFIG_FILE") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        // Override with environment variables
        if let Some(kind) = lookup("OBJSTORE_CREDS_KIND") {
            config.probe.kind =
                CredentialKind::from_str(&kind).map_err(CredentialsError::configuration)?;
        }

        if let Some(url) = lookup("OBJSTORE_CREDS_BUCKET_URL") {
            config.probe.bucket_url = Some(url);
        }

        if let Some(flag) = lookup("OBJSTORE_CREDS_EXCHANGE_SESSION_TOKEN") {
            config.probe.exchange_session_token =
                parse_env("OBJSTORE_CREDS_EXCHANGE_SESSION_TOKEN", &flag)?;
        }

        if let Some(path) = lookup("OBJSTORE_CREDS_SERVICE_ACCOUNT_FILE") {
            config.probe.service_account_file = Some(path);
        }

        if let Some(secs) = lookup("OBJSTORE_CREDS_GCP_DEFAULT_COOLDOWN_SECS") {
            config.resolver.gcp_default_cooldown_secs =
                parse_env("OBJSTORE_CREDS_GCP_DEFAULT_COOLDOWN_SECS", &secs)?;
        }

        if let Some(secs) = lookup("OBJSTORE_CREDS_SAS_TTL_SECS") {
            config.resolver.sas_ttl_secs = parse_env("OBJSTORE_CREDS_SAS_TTL_SECS", &secs)?;
        }

        if let Some(permissions) = lookup("OBJSTORE_CREDS_SAS_PERMISSIONS") {
            config.resolver.sas_permissions = permissions;
        }

        if let Some(secs) = lookup("OBJSTORE_CREDS_SESSION_TOKEN_DURATION_SECS") {
            config.resolver.session_token_duration_secs =
                parse_env("OBJSTORE_CREDS_SESSION_TOKEN_DURATION_SECS", &secs)?;
        }

        if let Some(level) = lookup("OBJSTORE_CREDS_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| CredentialsError::configuration(format!("{path}: {e}")))
    }
}
