//! Error types for objstore-creds
//!
//! Provides structured error handling using thiserror for every failure a
//! credential can hit on its way from raw input to an `object_store` option
//! map: construction, resolution, translation, session-token exchange and
//! connectivity probing.

use thiserror::Error;

/// Main error type for credential operations
#[derive(Error, Debug)]
pub enum CredentialsError {
    /// Malformed or incomplete credential construction
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Credential cannot be expressed as `object_store` options
    #[error("object_store credentials error: {0}")]
    ObjectStoreCredentials(String),

    /// GCP default credentials could not be resolved, or resolution was
    /// skipped because a recent attempt failed
    #[error("Default credentials unavailable: {0}")]
    DefaultCredentialsUnavailable(String),

    /// The credential mode has no `object_store` representation
    #[error("Unsupported credential mode: {0}")]
    UnsupportedCredentialMode(String),

    /// Session token exchange failed at the provider
    #[error("Session token exchange failed: {0}")]
    SessionToken(String),

    /// Bucket URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Storage backend could not be built
    #[error("Storage error: {0}")]
    Storage(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CredentialsError {
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    #[must_use]
    pub fn object_store(msg: impl Into<String>) -> Self {
        Self::ObjectStoreCredentials(msg.into())
    }

    #[must_use]
    pub fn defaults_unavailable(msg: impl Into<String>) -> Self {
        Self::DefaultCredentialsUnavailable(msg.into())
    }

    #[must_use]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedCredentialMode(msg.into())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CredentialsError>;

/// Fails with a configuration error when a required field is missing or blank.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CredentialsError::configuration(format!(
            "`{field}` is required"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        assert!(require("azure_storage_account_name", "acct").is_ok());
        let err = require("azure_storage_account_name", "  ").unwrap_err();
        assert!(matches!(err, CredentialsError::Configuration(_)));
        assert!(err.to_string().contains("azure_storage_account_name"));
    }
}
