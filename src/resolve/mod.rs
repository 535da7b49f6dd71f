//! Credential resolution engine
//!
//! [`CredentialResolver`] fills the gaps in a freshly constructed credential:
//! environment fallbacks for AWS, SAS-token derivation for Azure account keys
//! and application-default discovery for GCP. Everything ambient (environment,
//! time, SAS signing, the default-credential cooldown) is owned by the resolver
//! so tests can inject it instead of mutating process state.
//!
//! Resolution priority chain:
//! 1. Explicit fields set on the credential
//! 2. Environment variables (only for credentials built "with defaults")
//! 3. Derived values (SAS token from account key)

mod gcp_default;
mod sas;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::ResolverConfig;
use crate::credentials::azure::AzureSasCredentials;
use crate::credentials::Credentials;
use crate::errors::{CredentialsError, Result};
use secrecy::SecretString;

pub use gcp_default::{GcpDefaultResolver, GOOGLE_APPLICATION_CREDENTIALS, GOOGLE_CLOUD_PROJECT};
pub use sas::{normalize_permissions, AccountSasSigner, SasRequest, SasTokenIssuer, SAS_VERSION};

/// Permissions for derived SAS tokens unless configured otherwise.
pub const DEFAULT_SAS_PERMISSIONS: &str = "racwdl";

/// Environment lookup function.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves credentials against the environment, a clock and a SAS issuer.
pub struct CredentialResolver {
    env: EnvLookup,
    clock: Arc<dyn Clock>,
    sas_issuer: Arc<dyn SasTokenIssuer>,
    sas_permissions: String,
    sas_ttl: Duration,
    gcp_defaults: GcpDefaultResolver,
}

impl CredentialResolver {
    /// Resolver backed by the process environment and the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: Arc::new(|name: &str| std::env::var(name).ok()),
            clock: Arc::new(SystemClock),
            sas_issuer: Arc::new(AccountSasSigner),
            sas_permissions: DEFAULT_SAS_PERMISSIONS.to_string(),
            sas_ttl: Duration::days(1),
            gcp_defaults: GcpDefaultResolver::new(Duration::seconds(60)),
        }
    }

    /// Resolver with settings taken from configuration.
    ///
    /// Fails on SAS permissions or durations that cannot be used.
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        normalize_permissions(&config.sas_permissions)?;
        Ok(Self::new()
            .with_sas_permissions(config.sas_permissions.clone())
            .with_sas_ttl(config.sas_ttl()?)
            .with_gcp_default_cooldown(config.gcp_default_cooldown()?))
    }

    /// Replaces the environment lookup.
    ///
    /// This is primarily for testing, it allows injecting env var values
    /// without mutating the actual process environment.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_sas_issuer(mut self, issuer: Arc<dyn SasTokenIssuer>) -> Self {
        self.sas_issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_sas_permissions(mut self, permissions: impl Into<String>) -> Self {
        self.sas_permissions = permissions.into();
        self
    }

    #[must_use]
    pub fn with_sas_ttl(mut self, ttl: Duration) -> Self {
        self.sas_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_gcp_default_cooldown(mut self, cooldown: Duration) -> Self {
        self.gcp_defaults = GcpDefaultResolver::new(cooldown);
        self
    }

    /// Looks up an environment variable, treating empty values as unset.
    #[must_use]
    pub fn env(&self, name: &str) -> Option<String> {
        (self.env)(name).filter(|v| !v.trim().is_empty())
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Process-lifetime state for GCP default credential discovery.
    #[must_use]
    pub fn gcp_defaults(&self) -> &GcpDefaultResolver {
        &self.gcp_defaults
    }

    /// Resolves any credential variant.
    pub fn resolve(&self, credentials: Credentials) -> Result<Credentials> {
        credentials.resolve(self)
    }

    /// Derives an account SAS token from an Azure storage account key.
    pub(crate) fn derive_sas(
        &self,
        account_name: &str,
        account_key: &SecretString,
    ) -> Result<AzureSasCredentials> {
        let permissions = normalize_permissions(&self.sas_permissions)?;
        if self.sas_ttl <= Duration::zero() {
            return Err(CredentialsError::configuration(format!(
                "SAS lifetime must be positive, got {}",
                self.sas_ttl
            )));
        }
        let expiry = self.now().checked_add_signed(self.sas_ttl).ok_or_else(|| {
            CredentialsError::configuration(format!("SAS lifetime out of range: {}", self.sas_ttl))
        })?;
        let request = SasRequest {
            account_name,
            account_key,
            permissions: &permissions,
            expiry,
        };
        let token = self.sas_issuer.issue(&request)?;
        debug!(
            account = %account_name,
            permissions = %permissions,
            expiry = %expiry,
            "Derived account SAS token"
        );
        Ok(AzureSasCredentials::derived(account_name, token, expiry))
    }
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}
