//! objstore-creds - cloud credentials for `object_store`
//!
//! Turns Azure, AWS and GCP credentials into the flat option map that the
//! `object_store` crate (and deltalake `storage_options`) expect:
//!
//! 1. Build a credential value ([`credentials`]); construction validates
//!    required fields.
//! 2. Resolve it with a [`CredentialResolver`]: environment fallbacks, Azure
//!    SAS derivation, GCP application-default discovery. AWS credentials that
//!    name a profile load its keys with [`AwsCredentials::load_profile`].
//! 3. Translate with [`Credentials::to_object_store_options`].
//! 4. For AWS, optionally exchange keys for session credentials ([`sts`]) and
//!    translate the follow-up credential.
//! 5. Optionally prove the options authenticate with [`probe::can_connect`].
//!
//! ```no_run
//! use objstore_creds::{AwsCredentials, Credentials, CredentialResolver};
//!
//! # fn main() -> objstore_creds::Result<()> {
//! let resolver = CredentialResolver::new();
//! let creds: Credentials = AwsCredentials::without_defaults("AKID", "secret")
//!     .region_name("us-east-1")
//!     .build()?
//!     .into();
//! let options = resolver.resolve(creds)?.to_object_store_options()?;
//! assert!(!options.contains_key("aws_session_token"));
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod metrics;
pub mod options;
pub mod probe;
pub mod resolve;
mod secret;
pub mod sts;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use credentials::{
    AwsCredentials, AwsProfileLoader, AzureAccountKeyCredentials, AzureSasCredentials,
    AzureServicePrincipalCredentials, Credentials, GcpDefaultCredentials, GcpOAuthCredentials,
    GcpServiceAccountCredentials, Provider,
};
pub use errors::{CredentialsError, Result};
pub use options::ObjectStoreOptions;
pub use probe::{can_connect, check_connectivity, ProbeOutcome};
pub use resolve::CredentialResolver;
pub use secrecy::{ExposeSecret, SecretString};
pub use sts::{SessionCredentials, SessionTokenIssuer, StsSessionTokenIssuer};
