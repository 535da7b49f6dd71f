//! Google Cloud credentials
//!
//! `object_store` authenticates to GCS with a service-account key passed as a
//! JSON string. Service-account credentials and default credentials that
//! resolve to a service account translate to that string; OAuth (authorized
//! user) credentials have no `object_store` representation.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{require, CredentialsError, Result};
use crate::options::{keys, ObjectStoreOptions};
use crate::resolve::{CredentialResolver, GOOGLE_CLOUD_PROJECT};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const SERVICE_ACCOUNT_TYPE: &str = "service_account";
const AUTHORIZED_USER_TYPE: &str = "authorized_user";

/// Service-account key file layout, as written by `gcloud iam keys create`.
#[derive(Debug, Serialize, Deserialize)]
struct ServiceAccountKeyFile {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    private_key_id: Option<String>,
    private_key: String,
    client_email: String,
    #[serde(default)]
    token_uri: Option<String>,
}

/// Authorized-user file layout, as written by `gcloud auth application-default login`.
#[derive(Debug, Deserialize)]
struct AuthorizedUserFile {
    #[serde(rename = "type")]
    kind: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default)]
    quota_project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CredentialFileKind {
    #[serde(rename = "type")]
    kind: String,
}

/// Turns escaped `\n` sequences into newlines and makes the key end in one.
fn normalize_private_key(key: &str) -> String {
    let mut key = key.replace("\\n", "\n");
    if !key.ends_with('\n') {
        key.push('\n');
    }
    key
}

/// Service-account key credentials.
#[derive(Debug, Clone)]
pub struct GcpServiceAccountCredentials {
    project_id: String,
    private_key: SecretString,
    private_key_id: String,
    client_email: String,
    token_uri: String,
}

impl GcpServiceAccountCredentials {
    /// `private_key_id` is required; `object_store` rejects keys without it.
    pub fn new(
        project_id: impl Into<String>,
        private_key: impl Into<SecretString>,
        private_key_id: impl Into<String>,
        client_email: impl Into<String>,
    ) -> Result<Self> {
        let project_id = project_id.into();
        let private_key = private_key.into();
        let private_key_id = private_key_id.into();
        let client_email = client_email.into();
        require("project_id", &project_id)?;
        require("private_key", private_key.expose_secret())?;
        require("private_key_id", &private_key_id)?;
        require("client_email", &client_email)?;

        Ok(Self {
            project_id,
            private_key: SecretString::from(normalize_private_key(private_key.expose_secret())),
            private_key_id,
            client_email,
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        })
    }

    /// Parses a service-account JSON key document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_project(json, None)
    }

    /// Same as [`from_json`](Self::from_json), taking `project_id` when the
    /// key file has none.
    pub fn from_json_with_project(json: &str, project_id: Option<&str>) -> Result<Self> {
        let file: ServiceAccountKeyFile = serde_json::from_str(json)
            .map_err(|e| CredentialsError::configuration(format!("invalid service account key: {e}")))?;
        if file.kind != SERVICE_ACCOUNT_TYPE {
            return Err(CredentialsError::configuration(format!(
                "expected a `{SERVICE_ACCOUNT_TYPE}` key, got `{}`",
                file.kind
            )));
        }
        let credentials = Self::new(
            file.project_id
                .filter(|id| !id.trim().is_empty())
                .or_else(|| project_id.map(str::to_string))
                .unwrap_or_default(),
            file.private_key,
            file.private_key_id.unwrap_or_default(),
            file.client_email,
        )?;
        Ok(match file.token_uri {
            Some(uri) => credentials.with_token_uri(uri),
            None => credentials,
        })
    }

    #[must_use]
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn private_key(&self) -> &SecretString {
        &self.private_key
    }

    #[must_use]
    pub fn private_key_id(&self) -> &str {
        &self.private_key_id
    }

    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    #[must_use]
    pub fn token_uri(&self) -> &str {
        &self.token_uri
    }

    /// Renders the credentials as a service-account JSON key document.
    pub fn to_service_account_json(&self) -> Result<String> {
        let file = ServiceAccountKeyFile {
            kind: SERVICE_ACCOUNT_TYPE.to_string(),
            project_id: Some(self.project_id.clone()),
            private_key_id: Some(self.private_key_id.clone()),
            private_key: self.private_key.expose_secret().to_string(),
            client_email: self.client_email.clone(),
            token_uri: Some(self.token_uri.clone()),
        };
        Ok(serde_json::to_string(&file)?)
    }

    pub fn to_object_store_options(&self) -> Result<ObjectStoreOptions> {
        let mut options = ObjectStoreOptions::new();
        options.insert(keys::SERVICE_ACCOUNT_KEY, self.to_service_account_json()?);
        Ok(options)
    }
}

/// OAuth (authorized user) credentials.
#[derive(Debug, Clone)]
pub struct GcpOAuthCredentials {
    client_id: String,
    client_secret: SecretString,
    refresh_token: SecretString,
    project_id: Option<String>,
}

impl GcpOAuthCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
        refresh_token: impl Into<SecretString>,
    ) -> Result<Self> {
        let credentials = Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            project_id: None,
        };
        require("client_id", &credentials.client_id)?;
        require("client_secret", credentials.client_secret.expose_secret())?;
        require("refresh_token", credentials.refresh_token.expose_secret())?;
        Ok(credentials)
    }

    /// Parses an `authorized_user` JSON document.
    pub fn from_authorized_user_json(json: &str) -> Result<Self> {
        let file: AuthorizedUserFile = serde_json::from_str(json)
            .map_err(|e| CredentialsError::configuration(format!("invalid authorized user file: {e}")))?;
        if file.kind != AUTHORIZED_USER_TYPE {
            return Err(CredentialsError::configuration(format!(
                "expected an `{AUTHORIZED_USER_TYPE}` file, got `{}`",
                file.kind
            )));
        }
        let credentials = Self::new(file.client_id, file.client_secret, file.refresh_token)?;
        Ok(match file.quota_project_id {
            Some(project_id) => credentials.with_project_id(project_id),
            None => credentials,
        })
    }

    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Always fails: `object_store` cannot authenticate with OAuth user
    /// credentials.
    pub fn to_object_store_options(&self) -> Result<ObjectStoreOptions> {
        Err(CredentialsError::unsupported(
            "GCP OAuth credentials cannot be used with `object_store`, use a service account",
        ))
    }
}

/// Material discovered from the application-default environment.
#[derive(Debug, Clone)]
pub enum GcpDefaultMaterial {
    ServiceAccount(GcpServiceAccountCredentials),
    AuthorizedUser(GcpOAuthCredentials),
}

impl GcpDefaultMaterial {
    /// Parses a default credentials file, dispatching on its `type`.
    ///
    /// `project_id` fills a service-account key that lacks one.
    pub fn from_json(json: &str, project_id: Option<&str>) -> Result<Self> {
        let kind: CredentialFileKind = serde_json::from_str(json)?;
        match kind.kind.as_str() {
            SERVICE_ACCOUNT_TYPE => {
                GcpServiceAccountCredentials::from_json_with_project(json, project_id)
                    .map(Self::ServiceAccount)
            }
            AUTHORIZED_USER_TYPE => {
                GcpOAuthCredentials::from_authorized_user_json(json).map(Self::AuthorizedUser)
            }
            other => Err(CredentialsError::defaults_unavailable(format!(
                "unsupported default credentials type `{other}`"
            ))),
        }
    }

    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::ServiceAccount(c) => Some(c.project_id()),
            Self::AuthorizedUser(c) => c.project_id(),
        }
    }
}

/// Application-default credentials.
///
/// Empty until resolved; resolution goes through the resolver's
/// [`GcpDefaultResolver`](crate::resolve::GcpDefaultResolver) and its
/// failure cooldown.
#[derive(Debug, Clone, Default)]
pub struct GcpDefaultCredentials {
    project_id: Option<String>,
    material: Option<GcpDefaultMaterial>,
}

impl GcpDefaultCredentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Explicit project, else the one from the discovered material, else
    /// `GOOGLE_CLOUD_PROJECT`.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    #[must_use]
    pub fn material(&self) -> Option<&GcpDefaultMaterial> {
        self.material.as_ref()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.material.is_some()
    }

    pub fn resolve(mut self, resolver: &CredentialResolver) -> Result<Self> {
        if self.material.is_some() {
            return Ok(self);
        }
        let material = resolver.gcp_defaults().resolve(
            |name| resolver.env(name),
            resolver.now(),
            self.project_id.as_deref(),
        )?;

        if self.project_id.is_none() {
            self.project_id = material
                .project_id()
                .map(str::to_string)
                .or_else(|| resolver.env(GOOGLE_CLOUD_PROJECT));
        }
        debug!(project_id = ?self.project_id, "Resolved GCP default credentials");
        self.material = Some(material);
        Ok(self)
    }

    pub fn to_object_store_options(&self) -> Result<ObjectStoreOptions> {
        match &self.material {
            Some(GcpDefaultMaterial::ServiceAccount(c)) => c.to_object_store_options(),
            Some(GcpDefaultMaterial::AuthorizedUser(c)) => c.to_object_store_options(),
            None => Err(CredentialsError::defaults_unavailable(
                "default credentials were not resolved",
            )),
        }
    }
}
