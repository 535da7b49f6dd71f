//! Helpers for `secrecy` secret strings.

use secrecy::{ExposeSecret, SecretString};

/// True when the secret is empty or whitespace.
pub(crate) fn is_blank(secret: &SecretString) -> bool {
    secret.expose_secret().trim().is_empty()
}
