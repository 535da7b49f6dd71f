//! AWS access-key credentials
//!
//! Covers AWS S3 and S3-compatible stores (MinIO, R2, LocalStack). A credential
//! built *without defaults* must carry its keys explicitly; one built *with
//! defaults* takes whatever is missing from the standard `AWS_*` environment
//! variables at resolve time, and may end up with no keys at all, in which
//! case `object_store` falls back to its own provider chain (IRSA, instance
//! metadata). A credential naming a profile (`profile_name` or `AWS_PROFILE`)
//! without keys gets them from the shared AWS files through
//! [`AwsCredentials::load_profile`].

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::credentials::aws_profile::AwsProfileLoader;
use crate::errors::{CredentialsError, Result};
use crate::options::{keys, ObjectStoreOptions};
use crate::resolve::CredentialResolver;
use crate::secret::is_blank;

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const AWS_REGION: &str = "AWS_REGION";
pub const AWS_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const AWS_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";
pub const AWS_PROFILE: &str = "AWS_PROFILE";

/// AWS key credentials with optional session token, region and endpoint.
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    aws_access_key_id: Option<String>,
    aws_secret_access_key: Option<SecretString>,
    aws_session_token: Option<SecretString>,
    region_name: Option<String>,
    endpoint_url: Option<String>,
    profile_name: Option<String>,
    use_defaults: bool,
}

impl AwsCredentials {
    /// Builder for credentials that never consult the environment.
    pub fn without_defaults(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<SecretString>,
    ) -> AwsCredentialsBuilder {
        AwsCredentialsBuilder::default()
            .access_key_id(access_key_id)
            .secret_access_key(secret_access_key)
    }

    /// Builder for credentials that fill gaps from `AWS_*` variables.
    #[must_use]
    pub fn with_defaults() -> AwsCredentialsBuilder {
        AwsCredentialsBuilder {
            use_defaults: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn access_key_id(&self) -> Option<&str> {
        self.aws_access_key_id.as_deref()
    }

    #[must_use]
    pub fn secret_access_key(&self) -> Option<&SecretString> {
        self.aws_secret_access_key.as_ref()
    }

    #[must_use]
    pub fn session_token(&self) -> Option<&SecretString> {
        self.aws_session_token.as_ref()
    }

    #[must_use]
    pub fn region_name(&self) -> Option<&str> {
        self.region_name.as_deref()
    }

    #[must_use]
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    #[must_use]
    pub fn profile_name(&self) -> Option<&str> {
        self.profile_name.as_deref()
    }

    #[must_use]
    pub fn uses_defaults(&self) -> bool {
        self.use_defaults
    }

    /// True when the endpoint is plain HTTP.
    #[must_use]
    pub fn allows_http(&self) -> bool {
        self.endpoint_url
            .as_deref()
            .is_some_and(|url| url.to_ascii_lowercase().starts_with("http://"))
    }

    /// Fills missing fields from the environment when built with defaults.
    ///
    /// A session token is only taken from the environment together with the
    /// key pair it belongs to.
    pub fn resolve(mut self, resolver: &CredentialResolver) -> Result<Self> {
        if !self.use_defaults {
            return Ok(self);
        }

        if self.aws_access_key_id.is_none() {
            if let (Some(key_id), Some(secret)) = (
                resolver.env(AWS_ACCESS_KEY_ID),
                resolver.env(AWS_SECRET_ACCESS_KEY),
            ) {
                debug!(key_id = %key_id, "Using AWS keys from environment");
                self.aws_access_key_id = Some(key_id);
                self.aws_secret_access_key = Some(SecretString::from(secret));
                if self.aws_session_token.is_none() {
                    self.aws_session_token = resolver.env(AWS_SESSION_TOKEN).map(SecretString::from);
                }
            }
        }

        if self.region_name.is_none() {
            self.region_name = resolver
                .env(AWS_REGION)
                .or_else(|| resolver.env(AWS_DEFAULT_REGION));
        }
        if self.endpoint_url.is_none() {
            self.endpoint_url = resolver.env(AWS_ENDPOINT_URL);
        }
        if self.profile_name.is_none() {
            self.profile_name = resolver.env(AWS_PROFILE);
        }

        self.validate()?;
        Ok(self)
    }

    /// Fills missing keys from the named profile.
    ///
    /// Returns the credential unchanged when it already has keys or names no
    /// profile. A profile that cannot be loaded is an error rather than a
    /// silent fall back to the `object_store` provider chain.
    pub async fn load_profile(mut self, loader: &AwsProfileLoader) -> Result<Self> {
        if self.aws_access_key_id.is_some() {
            return Ok(self);
        }
        let Some(profile) = self.profile_name.clone() else {
            return Ok(self);
        };

        let loaded = loader.load(&profile).await?;
        debug!(profile = %profile, key_id = %loaded.access_key_id(), "Using AWS keys from profile");
        self.aws_access_key_id = Some(loaded.access_key_id().to_string());
        self.aws_secret_access_key = Some(SecretString::from(loaded.secret_access_key()));
        self.aws_session_token = loaded.session_token().map(SecretString::from);
        self.validate()?;
        Ok(self)
    }

    /// Maps the credential to `object_store` S3 options.
    pub fn to_object_store_options(&self) -> Result<ObjectStoreOptions> {
        if self.endpoint_url.is_none() && self.region_name.is_none() {
            return Err(CredentialsError::object_store(
                "`object_store` requires `region_name` when no `endpoint_url` is set",
            ));
        }

        let mut options = ObjectStoreOptions::new();
        options.insert_opt(keys::AWS_ACCESS_KEY_ID, self.access_key_id());
        options.insert_opt(
            keys::AWS_SECRET_ACCESS_KEY,
            self.aws_secret_access_key.as_ref().map(|s| s.expose_secret()),
        );
        options.insert_opt(
            keys::AWS_SESSION_TOKEN,
            self.aws_session_token.as_ref().map(|s| s.expose_secret()),
        );
        options.insert_opt(keys::AWS_REGION, self.region_name());
        options.insert_opt(keys::AWS_ENDPOINT_URL, self.endpoint_url());
        if self.allows_http() {
            options.insert(keys::AWS_ALLOW_HTTP, "true");
        }
        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(_), None) => {
                return Err(CredentialsError::configuration(
                    "`aws_secret_access_key` is required with `aws_access_key_id`",
                ))
            }
            (None, Some(_)) => {
                return Err(CredentialsError::configuration(
                    "`aws_access_key_id` is required with `aws_secret_access_key`",
                ))
            }
            (None, None) if !self.use_defaults => {
                return Err(CredentialsError::configuration(
                    "`aws_access_key_id` and `aws_secret_access_key` are required",
                ))
            }
            _ => {}
        }

        if self.aws_session_token.is_some() && self.aws_access_key_id.is_none() {
            return Err(CredentialsError::configuration(
                "`aws_session_token` requires `aws_access_key_id`",
            ));
        }

        if let Some(endpoint) = &self.endpoint_url {
            let url = Url::parse(endpoint).map_err(|e| {
                CredentialsError::configuration(format!("invalid `endpoint_url` {endpoint}: {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(CredentialsError::configuration(format!(
                    "`endpoint_url` must be http or https, got {}",
                    url.scheme()
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`AwsCredentials`]. Blank values count as unset.
#[derive(Debug, Clone, Default)]
pub struct AwsCredentialsBuilder {
    aws_access_key_id: Option<String>,
    aws_secret_access_key: Option<SecretString>,
    aws_session_token: Option<SecretString>,
    region_name: Option<String>,
    endpoint_url: Option<String>,
    profile_name: Option<String>,
    use_defaults: bool,
}

fn non_blank(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

fn non_blank_secret(value: SecretString) -> Option<SecretString> {
    (!is_blank(&value)).then_some(value)
}

impl AwsCredentialsBuilder {
    #[must_use]
    pub fn access_key_id(mut self, value: impl Into<String>) -> Self {
        self.aws_access_key_id = non_blank(value.into());
        self
    }

    #[must_use]
    pub fn secret_access_key(mut self, value: impl Into<SecretString>) -> Self {
        self.aws_secret_access_key = non_blank_secret(value.into());
        self
    }

    #[must_use]
    pub fn session_token(mut self, value: impl Into<SecretString>) -> Self {
        self.aws_session_token = non_blank_secret(value.into());
        self
    }

    #[must_use]
    pub fn region_name(mut self, value: impl Into<String>) -> Self {
        self.region_name = non_blank(value.into());
        self
    }

    #[must_use]
    pub fn endpoint_url(mut self, value: impl Into<String>) -> Self {
        self.endpoint_url = non_blank(value.into());
        self
    }

    #[must_use]
    pub fn profile_name(mut self, value: impl Into<String>) -> Self {
        self.profile_name = non_blank(value.into());
        self
    }

    pub fn build(self) -> Result<AwsCredentials> {
        let credentials = AwsCredentials {
            aws_access_key_id: self.aws_access_key_id,
            aws_secret_access_key: self.aws_secret_access_key,
            aws_session_token: self.aws_session_token,
            region_name: self.region_name,
            endpoint_url: self.endpoint_url,
            profile_name: self.profile_name,
            use_defaults: self.use_defaults,
        };
        credentials.validate()?;
        Ok(credentials)
    }
}
