//! AWS session-token exchange
//!
//! Exchanges long-lived access keys for short-lived session credentials with
//! STS `GetSessionToken`. The call is a single round-trip: no retries and no
//! timeout beyond what the caller imposes.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::config::Credentials as StaticCredentials;
use aws_sdk_sts::error::DisplayErrorContext;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use crate::credentials::aws::AwsCredentials;
use crate::credentials::aws_profile::AwsProfileLoader;
use crate::errors::{CredentialsError, Result};
use crate::metrics::SESSION_TOKEN_EXCHANGES;

/// Region used for STS when the credential has none.
pub const DEFAULT_STS_REGION: &str = "us-east-1";

/// Short-lived AWS credentials.
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: SecretString,
    pub expiration: Option<DateTime<Utc>>,
}

impl SessionCredentials {
    /// Builds the follow-up credential carrying the session token.
    pub fn into_aws_credentials(
        self,
        region_name: Option<&str>,
        endpoint_url: Option<&str>,
    ) -> Result<AwsCredentials> {
        let mut builder =
            AwsCredentials::without_defaults(self.access_key_id, self.secret_access_key)
                .session_token(self.session_token);
        if let Some(region) = region_name {
            builder = builder.region_name(region);
        }
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        builder.build()
    }
}

/// Issues session credentials for long-lived keys.
#[async_trait]
pub trait SessionTokenIssuer: Send + Sync {
    async fn issue(
        &self,
        credentials: &AwsCredentials,
        duration: Duration,
    ) -> Result<SessionCredentials>;
}

/// Issuer backed by AWS STS.
///
/// Signs with the credential's keys, or with its profile's keys when it has
/// none.
#[derive(Debug, Default, Clone)]
pub struct StsSessionTokenIssuer {
    profiles: AwsProfileLoader,
}

impl StsSessionTokenIssuer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads profiles through `profiles` instead of the default AWS files.
    #[must_use]
    pub fn with_profiles(mut self, profiles: AwsProfileLoader) -> Self {
        self.profiles = profiles;
        self
    }
}

#[async_trait]
impl SessionTokenIssuer for StsSessionTokenIssuer {
    #[instrument(
        skip(self, credentials),
        fields(key_id = credentials.access_key_id(), profile = credentials.profile_name())
    )]
    async fn issue(
        &self,
        credentials: &AwsCredentials,
        duration: Duration,
    ) -> Result<SessionCredentials> {
        let duration_secs = i32::try_from(duration.num_seconds()).map_err(|_| {
            CredentialsError::configuration(format!(
                "session duration out of range: {}s",
                duration.num_seconds()
            ))
        })?;

        let region = credentials
            .region_name()
            .unwrap_or(DEFAULT_STS_REGION)
            .to_string();
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
        loader = match (
            credentials.access_key_id(),
            credentials.secret_access_key(),
            credentials.profile_name(),
        ) {
            (Some(key_id), Some(secret), _) => loader.credentials_provider(StaticCredentials::new(
                key_id,
                secret.expose_secret(),
                credentials.session_token().map(|t| t.expose_secret().to_string()),
                None,
                "objstore-creds",
            )),
            (None, None, Some(profile)) => {
                loader.credentials_provider(self.profiles.provider(profile))
            }
            _ => {
                return Err(CredentialsError::configuration(
                    "session token exchange requires `aws_access_key_id` and \
                     `aws_secret_access_key`, or a profile",
                ))
            }
        };
        if let Some(endpoint) = credentials.endpoint_url() {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        let client = aws_sdk_sts::Client::new(&sdk_config);

        let output = client
            .get_session_token()
            .duration_seconds(duration_secs)
            .send()
            .await
            .map_err(|e| CredentialsError::SessionToken(DisplayErrorContext(&e).to_string()))?;

        let issued = output.credentials().ok_or_else(|| {
            CredentialsError::SessionToken("STS response carried no credentials".to_string())
        })?;
        let expiration = issued.expiration();

        Ok(SessionCredentials {
            access_key_id: issued.access_key_id().to_string(),
            secret_access_key: SecretString::from(issued.secret_access_key()),
            session_token: SecretString::from(issued.session_token()),
            expiration: DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos()),
        })
    }
}

impl AwsCredentials {
    /// Returns session credentials for this credential.
    ///
    /// A credential that already carries a session token is returned as is;
    /// otherwise the issuer mints a new token valid for `duration`.
    pub async fn to_session_credentials(
        &self,
        issuer: &dyn SessionTokenIssuer,
        duration: Duration,
    ) -> Result<SessionCredentials> {
        if let (Some(key_id), Some(secret), Some(token)) = (
            self.access_key_id(),
            self.secret_access_key(),
            self.session_token(),
        ) {
            return Ok(SessionCredentials {
                access_key_id: key_id.to_string(),
                secret_access_key: secret.clone(),
                session_token: token.clone(),
                expiration: None,
            });
        }

        match issuer.issue(self, duration).await {
            Ok(session) => {
                SESSION_TOKEN_EXCHANGES.with_label_values(&["ok"]).inc();
                info!(
                    key_id = %session.access_key_id,
                    expiration = ?session.expiration,
                    "Issued AWS session credentials"
                );
                Ok(session)
            }
            Err(e) => {
                SESSION_TOKEN_EXCHANGES.with_label_values(&["error"]).inc();
                warn!(error = %e, "AWS session token exchange failed");
                Err(e)
            }
        }
    }
}
