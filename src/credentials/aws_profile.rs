//! Named AWS profiles
//!
//! Keys for a profile come from the shared `config`/`credentials` files, read
//! with aws-config's profile provider. Loading is async, so it runs as a
//! separate step after [`CredentialResolver`](crate::CredentialResolver)
//! resolution.

use std::path::PathBuf;

use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials as ProfileKeys;
use aws_sdk_sts::error::DisplayErrorContext;
use tracing::instrument;

use crate::errors::{CredentialsError, Result};

/// Loads access keys for named profiles.
///
/// Reads `~/.aws/config` and `~/.aws/credentials` (or `AWS_CONFIG_FILE` and
/// `AWS_SHARED_CREDENTIALS_FILE`) unless explicit files are given.
#[derive(Debug, Clone, Default)]
pub struct AwsProfileLoader {
    config_file: Option<PathBuf>,
    credentials_file: Option<PathBuf>,
}

impl AwsProfileLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    pub(crate) fn provider(&self, profile: &str) -> ProfileFileCredentialsProvider {
        let mut builder = ProfileFileCredentialsProvider::builder().profile_name(profile);
        if self.config_file.is_some() || self.credentials_file.is_some() {
            let mut files = ProfileFiles::builder();
            if let Some(path) = &self.config_file {
                files = files.with_file(ProfileFileKind::Config, path);
            }
            if let Some(path) = &self.credentials_file {
                files = files.with_file(ProfileFileKind::Credentials, path);
            }
            builder = builder.profile_files(files.build());
        }
        builder.build()
    }

    /// Keys (and session token, if any) configured for `profile`.
    #[instrument(skip(self))]
    pub async fn load(&self, profile: &str) -> Result<ProfileKeys> {
        self.provider(profile)
            .provide_credentials()
            .await
            .map_err(|e| {
                CredentialsError::defaults_unavailable(format!(
                    "AWS profile `{profile}`: {}",
                    DisplayErrorContext(&e)
                ))
            })
    }
}
