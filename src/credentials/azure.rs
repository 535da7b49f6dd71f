//! Azure storage credentials
//!
//! Three auth modes map onto `object_store` Azure options:
//! - storage account name + account key
//! - an account SAS token derived from the account key
//! - a service principal (tenant / client id / client secret)

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use crate::errors::{require, CredentialsError, Result};
use crate::options::{keys, ObjectStoreOptions};
use crate::resolve::CredentialResolver;

pub const AZURE_STORAGE_ACCOUNT_NAME: &str = "AZURE_STORAGE_ACCOUNT_NAME";
pub const AZURE_STORAGE_ACCOUNT_KEY: &str = "AZURE_STORAGE_ACCOUNT_KEY";
pub const AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";

fn required_env(resolver: &CredentialResolver, name: &str) -> Result<String> {
    resolver
        .env(name)
        .ok_or_else(|| CredentialsError::configuration(format!("`{name}` is not set")))
}

/// Storage account key credentials.
///
/// Resolution derives an account SAS token; once present, the token replaces
/// the key in the translated options.
#[derive(Debug, Clone)]
pub struct AzureAccountKeyCredentials {
    azure_storage_account_name: String,
    azure_storage_account_key: SecretString,
    azure_storage_sas_token: Option<AzureSasCredentials>,
}

impl AzureAccountKeyCredentials {
    pub fn new(
        account_name: impl Into<String>,
        account_key: impl Into<SecretString>,
    ) -> Result<Self> {
        let account_name = account_name.into();
        let account_key = account_key.into();
        require("azure_storage_account_name", &account_name)?;
        require("azure_storage_account_key", account_key.expose_secret())?;
        STANDARD.decode(account_key.expose_secret().trim()).map_err(|e| {
            CredentialsError::configuration(format!(
                "`azure_storage_account_key` is not valid base64: {e}"
            ))
        })?;

        Ok(Self {
            azure_storage_account_name: account_name,
            azure_storage_account_key: account_key,
            azure_storage_sas_token: None,
        })
    }

    /// Reads `AZURE_STORAGE_ACCOUNT_NAME` and `AZURE_STORAGE_ACCOUNT_KEY`.
    pub fn from_env(resolver: &CredentialResolver) -> Result<Self> {
        Self::new(
            required_env(resolver, AZURE_STORAGE_ACCOUNT_NAME)?,
            required_env(resolver, AZURE_STORAGE_ACCOUNT_KEY)?,
        )
    }

    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.azure_storage_account_name
    }

    #[must_use]
    pub fn account_key(&self) -> &SecretString {
        &self.azure_storage_account_key
    }

    /// The derived SAS credentials, present after resolution.
    #[must_use]
    pub fn sas_token(&self) -> Option<&AzureSasCredentials> {
        self.azure_storage_sas_token.as_ref()
    }

    /// Derives a SAS token when none is present.
    pub fn resolve(mut self, resolver: &CredentialResolver) -> Result<Self> {
        if self.azure_storage_sas_token.is_none() {
            let sas = resolver
                .derive_sas(&self.azure_storage_account_name, &self.azure_storage_account_key)?;
            self.azure_storage_sas_token = Some(sas);
        }
        Ok(self)
    }

    /// Drops the account key, keeping only the derived SAS credentials.
    #[must_use]
    pub fn into_sas(self) -> Option<AzureSasCredentials> {
        self.azure_storage_sas_token
    }

    pub fn to_object_store_options(&self) -> Result<ObjectStoreOptions> {
        if let Some(sas) = &self.azure_storage_sas_token {
            return Ok(sas.to_object_store_options());
        }
        let mut options = ObjectStoreOptions::new();
        options.insert(
            keys::AZURE_STORAGE_ACCOUNT_NAME,
            self.azure_storage_account_name.as_str(),
        );
        options.insert(
            keys::AZURE_STORAGE_ACCOUNT_KEY,
            self.azure_storage_account_key.expose_secret(),
        );
        Ok(options)
    }
}

/// Account SAS token credentials.
///
/// Only obtainable by deriving from an account name and key, see
/// [`AzureAccountKeyCredentials::resolve`].
#[derive(Debug, Clone)]
pub struct AzureSasCredentials {
    azure_storage_account_name: String,
    azure_storage_sas_token: SecretString,
    expires_at: DateTime<Utc>,
}

impl AzureSasCredentials {
    pub(crate) fn derived(
        account_name: &str,
        sas_token: String,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            azure_storage_account_name: account_name.to_string(),
            azure_storage_sas_token: SecretString::from(sas_token),
            expires_at,
        }
    }

    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.azure_storage_account_name
    }

    #[must_use]
    pub fn sas_token(&self) -> &SecretString {
        &self.azure_storage_sas_token
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn to_object_store_options(&self) -> ObjectStoreOptions {
        let mut options = ObjectStoreOptions::new();
        options.insert(
            keys::AZURE_STORAGE_ACCOUNT_NAME,
            self.azure_storage_account_name.as_str(),
        );
        options.insert(
            keys::AZURE_STORAGE_SAS_TOKEN,
            self.azure_storage_sas_token.expose_secret(),
        );
        options
    }
}

/// Service principal (client secret) credentials.
#[derive(Debug, Clone)]
pub struct AzureServicePrincipalCredentials {
    azure_storage_account_name: String,
    azure_tenant_id: String,
    azure_client_id: String,
    azure_client_secret: SecretString,
}

impl AzureServicePrincipalCredentials {
    pub fn new(
        account_name: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
    ) -> Result<Self> {
        let credentials = Self {
            azure_storage_account_name: account_name.into(),
            azure_tenant_id: tenant_id.into(),
            azure_client_id: client_id.into(),
            azure_client_secret: client_secret.into(),
        };
        require("azure_storage_account_name", &credentials.azure_storage_account_name)?;
        require("azure_tenant_id", &credentials.azure_tenant_id)?;
        require("azure_client_id", &credentials.azure_client_id)?;
        require("azure_client_secret", credentials.azure_client_secret.expose_secret())?;
        Ok(credentials)
    }

    /// Reads the standard `AZURE_*` service principal variables.
    pub fn from_env(resolver: &CredentialResolver) -> Result<Self> {
        Self::new(
            required_env(resolver, AZURE_STORAGE_ACCOUNT_NAME)?,
            required_env(resolver, AZURE_TENANT_ID)?,
            required_env(resolver, AZURE_CLIENT_ID)?,
            required_env(resolver, AZURE_CLIENT_SECRET)?,
        )
    }

    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.azure_storage_account_name
    }

    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.azure_tenant_id
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.azure_client_id
    }

    #[must_use]
    pub fn to_object_store_options(&self) -> ObjectStoreOptions {
        let mut options = ObjectStoreOptions::new();
        options.insert(keys::AZURE_STORAGE_TENANT_ID, self.azure_tenant_id.as_str());
        options.insert(keys::AZURE_STORAGE_CLIENT_ID, self.azure_client_id.as_str());
        options.insert(
            keys::AZURE_STORAGE_CLIENT_SECRET,
            self.azure_client_secret.expose_secret(),
        );
        options.insert(
            keys::AZURE_STORAGE_ACCOUNT_NAME,
            self.azure_storage_account_name.as_str(),
        );
        options
    }
}
