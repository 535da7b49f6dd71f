//! Credential value objects and their translation into `object_store` options
//!
//! Each cloud provider gets its own module with one type per auth mode.
//! [`Credentials`] is the sum of every mode; its translation is an exhaustive
//! match, so a mode without an `object_store` representation (GCP OAuth) is an
//! explicit arm rather than a silent fallthrough.

pub mod aws;
pub mod aws_profile;
pub mod azure;
pub mod gcp;

use std::fmt;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::metrics::{RESOLUTIONS, TRANSLATIONS};
use crate::options::ObjectStoreOptions;
use crate::resolve::CredentialResolver;

pub use aws::{AwsCredentials, AwsCredentialsBuilder};
pub use aws_profile::AwsProfileLoader;
pub use azure::{AzureAccountKeyCredentials, AzureSasCredentials, AzureServicePrincipalCredentials};
pub use gcp::{
    GcpDefaultCredentials, GcpDefaultMaterial, GcpOAuthCredentials, GcpServiceAccountCredentials,
};

/// Cloud provider a credential belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// AWS S3 and S3-compatible stores
    Aws,
    /// Azure Blob Storage / ADLS Gen2
    Azure,
    /// Google Cloud Storage
    Gcp,
}

impl Provider {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Any supported credential.
#[derive(Debug, Clone)]
pub enum Credentials {
    AzureAccountKey(AzureAccountKeyCredentials),
    AzureSas(AzureSasCredentials),
    AzureServicePrincipal(AzureServicePrincipalCredentials),
    Aws(AwsCredentials),
    GcpServiceAccount(GcpServiceAccountCredentials),
    GcpDefault(GcpDefaultCredentials),
    GcpOAuth(GcpOAuthCredentials),
}

impl Credentials {
    #[must_use]
    pub fn provider(&self) -> Provider {
        match self {
            Self::AzureAccountKey(_) | Self::AzureSas(_) | Self::AzureServicePrincipal(_) => {
                Provider::Azure
            }
            Self::Aws(_) => Provider::Aws,
            Self::GcpServiceAccount(_) | Self::GcpDefault(_) | Self::GcpOAuth(_) => Provider::Gcp,
        }
    }

    /// Short name of the auth mode, used in logs and metrics.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Self::AzureAccountKey(_) => "azure_account_key",
            Self::AzureSas(_) => "azure_sas",
            Self::AzureServicePrincipal(_) => "azure_service_principal",
            Self::Aws(_) => "aws",
            Self::GcpServiceAccount(_) => "gcp_service_account",
            Self::GcpDefault(_) => "gcp_default",
            Self::GcpOAuth(_) => "gcp_oauth",
        }
    }

    /// Fills missing fields from the resolver's environment and derives
    /// dependent values. Complete credentials are returned unchanged.
    pub fn resolve(self, resolver: &CredentialResolver) -> Result<Self> {
        let mode = self.mode();
        let resolved = match self {
            Self::AzureAccountKey(c) => c.resolve(resolver).map(Self::AzureAccountKey),
            Self::AzureSas(c) => Ok(Self::AzureSas(c)),
            Self::AzureServicePrincipal(c) => Ok(Self::AzureServicePrincipal(c)),
            Self::Aws(c) => c.resolve(resolver).map(Self::Aws),
            Self::GcpServiceAccount(c) => Ok(Self::GcpServiceAccount(c)),
            Self::GcpDefault(c) => c.resolve(resolver).map(Self::GcpDefault),
            Self::GcpOAuth(c) => Ok(Self::GcpOAuth(c)),
        };
        let outcome = if resolved.is_ok() { "ok" } else { "error" };
        RESOLUTIONS.with_label_values(&[mode, outcome]).inc();
        resolved
    }

    /// Translates the credential into `object_store` options.
    ///
    /// Pure: no network access and no mutation.
    pub fn to_object_store_options(&self) -> Result<ObjectStoreOptions> {
        let provider = self.provider();
        let translated = match self {
            Self::AzureAccountKey(c) => c.to_object_store_options(),
            Self::AzureSas(c) => Ok(c.to_object_store_options()),
            Self::AzureServicePrincipal(c) => Ok(c.to_object_store_options()),
            Self::Aws(c) => c.to_object_store_options(),
            Self::GcpServiceAccount(c) => c.to_object_store_options(),
            Self::GcpDefault(c) => c.to_object_store_options(),
            Self::GcpOAuth(c) => c.to_object_store_options(),
        }
        .and_then(|options| {
            options.ensure_known_keys(provider)?;
            Ok(options)
        });

        match &translated {
            Ok(options) => {
                TRANSLATIONS.with_label_values(&[provider.name(), "ok"]).inc();
                debug!(mode = self.mode(), %options, "Translated credentials");
            }
            Err(e) => {
                TRANSLATIONS
                    .with_label_values(&[provider.name(), "error"])
                    .inc();
                warn!(mode = self.mode(), error = %e, "Credential translation failed");
            }
        }
        translated
    }
}

impl From<AzureAccountKeyCredentials> for Credentials {
    fn from(c: AzureAccountKeyCredentials) -> Self {
        Self::AzureAccountKey(c)
    }
}

impl From<AzureSasCredentials> for Credentials {
    fn from(c: AzureSasCredentials) -> Self {
        Self::AzureSas(c)
    }
}

impl From<AzureServicePrincipalCredentials> for Credentials {
    fn from(c: AzureServicePrincipalCredentials) -> Self {
        Self::AzureServicePrincipal(c)
    }
}

impl From<AwsCredentials> for Credentials {
    fn from(c: AwsCredentials) -> Self {
        Self::Aws(c)
    }
}

impl From<GcpServiceAccountCredentials> for Credentials {
    fn from(c: GcpServiceAccountCredentials) -> Self {
        Self::GcpServiceAccount(c)
    }
}

impl From<GcpDefaultCredentials> for Credentials {
    fn from(c: GcpDefaultCredentials) -> Self {
        Self::GcpDefault(c)
    }
}

impl From<GcpOAuthCredentials> for Credentials {
    fn from(c: GcpOAuthCredentials) -> Self {
        Self::GcpOAuth(c)
    }
}
