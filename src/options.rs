//! Object-store option maps.
//!
//! [`ObjectStoreOptions`] is the flat, string-keyed configuration handed to
//! `object_store` (`parse_url_opts`, `*Builder::with_config`) or anything
//! layered on top of it, such as deltalake `storage_options`. Key names are
//! part of that contract and live in [`keys`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use object_store::aws::AmazonS3ConfigKey;
use object_store::azure::AzureConfigKey;
use object_store::gcp::GoogleConfigKey;

use crate::credentials::Provider;
use crate::errors::{CredentialsError, Result};

/// Option key names understood by `object_store`.
pub mod keys {
    pub const AWS_ACCESS_KEY_ID: &str = "aws_access_key_id";
    pub const AWS_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
    pub const AWS_SESSION_TOKEN: &str = "aws_session_token";
    pub const AWS_REGION: &str = "aws_region";
    pub const AWS_ENDPOINT_URL: &str = "aws_endpoint_url";
    pub const AWS_ALLOW_HTTP: &str = "aws_allow_http";

    pub const AZURE_STORAGE_ACCOUNT_NAME: &str = "azure_storage_account_name";
    pub const AZURE_STORAGE_ACCOUNT_KEY: &str = "azure_storage_account_key";
    pub const AZURE_STORAGE_SAS_TOKEN: &str = "azure_storage_sas_token";
    pub const AZURE_STORAGE_TENANT_ID: &str = "azure_storage_tenant_id";
    pub const AZURE_STORAGE_CLIENT_ID: &str = "azure_storage_client_id";
    pub const AZURE_STORAGE_CLIENT_SECRET: &str = "azure_storage_client_secret";

    pub const SERVICE_ACCOUNT_KEY: &str = "service_account_key";
}

/// Substring patterns that mark a key as holding a secret value.
const SECRET_PATTERNS: &[&str] = &[
    "secret",
    "account_key",
    "sas_token",
    "session_token",
    "service_account_key",
];

/// Returns true if the option key holds a secret value.
///
/// `aws_access_key_id` is an identifier, not a secret.
#[must_use]
pub fn is_secret_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SECRET_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Ordered option map consumed by `object_store`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ObjectStoreOptions {
    options: BTreeMap<String, String>,
}

impl ObjectStoreOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.options.insert(key.to_string(), value.into());
    }

    /// Inserts the value only when it is present.
    pub fn insert_opt(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.options.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.options
    }

    /// Checks that every key parses as a config key of the provider's
    /// `object_store` builder.
    pub fn ensure_known_keys(&self, provider: Provider) -> Result<()> {
        for key in self.options.keys() {
            let known = match provider {
                Provider::Aws => AmazonS3ConfigKey::from_str(key).is_ok(),
                Provider::Azure => AzureConfigKey::from_str(key).is_ok(),
                Provider::Gcp => GoogleConfigKey::from_str(key).is_ok(),
            };
            if !known {
                return Err(CredentialsError::object_store(format!(
                    "`{key}` is not a recognized {provider} option"
                )));
            }
        }
        Ok(())
    }

    /// Returns a copy with secret values replaced by `***`.
    #[must_use]
    pub fn redacted(&self) -> BTreeMap<String, String> {
        self.options
            .iter()
            .map(|(k, v)| {
                if is_secret_key(k) {
                    (k.clone(), "***".to_string())
                } else {
                    (k.clone(), v.clone())
                }
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a ObjectStoreOptions {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}

impl From<ObjectStoreOptions> for std::collections::HashMap<String, String> {
    fn from(options: ObjectStoreOptions) -> Self {
        options.options.into_iter().collect()
    }
}

impl fmt::Debug for ObjectStoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.redacted()).finish()
    }
}

impl fmt::Display for ObjectStoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = self
            .redacted()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>();
        f.write_str(&pairs.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_keys() {
        assert!(is_secret_key(keys::AWS_SECRET_ACCESS_KEY));
        assert!(is_secret_key(keys::AWS_SESSION_TOKEN));
        assert!(is_secret_key(keys::AZURE_STORAGE_ACCOUNT_KEY));
        assert!(is_secret_key(keys::AZURE_STORAGE_SAS_TOKEN));
        assert!(is_secret_key(keys::AZURE_STORAGE_CLIENT_SECRET));
        assert!(is_secret_key(keys::SERVICE_ACCOUNT_KEY));
        assert!(!is_secret_key(keys::AWS_ACCESS_KEY_ID));
        assert!(!is_secret_key(keys::AWS_REGION));
        assert!(!is_secret_key(keys::AZURE_STORAGE_ACCOUNT_NAME));
    }

    #[test]
    fn test_display_redacts_and_sorts() {
        let mut options = ObjectStoreOptions::new();
        options.insert(keys::AWS_SECRET_ACCESS_KEY, "s3cr3t");
        options.insert(keys::AWS_ACCESS_KEY_ID, "AKID");
        options.insert(keys::AWS_REGION, "us-east-1");

        let shown = options.to_string();
        assert_eq!(
            shown,
            "aws_access_key_id=AKID, aws_region=us-east-1, aws_secret_access_key=***"
        );
        assert!(!format!("{options:?}").contains("s3cr3t"));
    }

    #[test]
    fn test_insert_opt_skips_none() {
        let mut options = ObjectStoreOptions::new();
        options.insert_opt(keys::AWS_REGION, None);
        options.insert_opt(keys::AWS_ENDPOINT_URL, Some("http://localhost:9000"));
        assert!(!options.contains_key(keys::AWS_REGION));
        assert_eq!(
            options.get(keys::AWS_ENDPOINT_URL),
            Some("http://localhost:9000")
        );
        assert_eq!(options.len(), 1);
    }

    #[test]
    fn test_all_key_constants_are_known_to_object_store() {
        let mut aws = ObjectStoreOptions::new();
        for key in [
            keys::AWS_ACCESS_KEY_ID,
            keys::AWS_SECRET_ACCESS_KEY,
            keys::AWS_SESSION_TOKEN,
            keys::AWS_REGION,
            keys::AWS_ENDPOINT_URL,
            keys::AWS_ALLOW_HTTP,
        ] {
            aws.insert(key, "x");
        }
        aws.ensure_known_keys(Provider::Aws).unwrap();

        let mut azure = ObjectStoreOptions::new();
        for key in [
            keys::AZURE_STORAGE_ACCOUNT_NAME,
            keys::AZURE_STORAGE_ACCOUNT_KEY,
            keys::AZURE_STORAGE_SAS_TOKEN,
            keys::AZURE_STORAGE_TENANT_ID,
            keys::AZURE_STORAGE_CLIENT_ID,
            keys::AZURE_STORAGE_CLIENT_SECRET,
        ] {
            azure.insert(key, "x");
        }
        azure.ensure_known_keys(Provider::Azure).unwrap();

        let mut gcp = ObjectStoreOptions::new();
        gcp.insert(keys::SERVICE_ACCOUNT_KEY, "{}");
        gcp.ensure_known_keys(Provider::Gcp).unwrap();
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut options = ObjectStoreOptions::new();
        options.insert("not_an_option", "x");
        let err = options.ensure_known_keys(Provider::Gcp).unwrap_err();
        assert!(matches!(err, CredentialsError::ObjectStoreCredentials(_)));
    }
}
