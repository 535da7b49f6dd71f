//! Connectivity probe
//!
//! Builds an `object_store` handle for a bucket URL from translated options and
//! issues a `HEAD` for a sentinel object. A `NotFound` answer proves the
//! credentials were accepted: the store authenticated the request and
//! reported the object as absent.

use object_store::path::Path;
use object_store::ObjectStore;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::Result;
use crate::metrics::PROBES;
use crate::options::ObjectStoreOptions;

/// Object looked up under the bucket URL's path.
pub const PROBE_OBJECT: &str = "_objstore_creds_probe";

/// Result of a connectivity probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The sentinel object exists
    Found,
    /// Authenticated; the sentinel object does not exist
    NotFound,
    /// The store rejected the request
    Denied(String),
}

impl ProbeOutcome {
    /// True for every outcome in which the store accepted the credentials.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Found | Self::NotFound)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Denied(_) => "denied",
        }
    }
}

/// Probes `bucket_url` with the given options.
///
/// Errors only when the URL is invalid or the store cannot be built from the
/// options; a rejected request is reported as [`ProbeOutcome::Denied`].
#[instrument(skip(options), fields(options = %options))]
pub async fn check_connectivity(
    bucket_url: &str,
    options: &ObjectStoreOptions,
) -> Result<ProbeOutcome> {
    let url = Url::parse(bucket_url)?;
    let (store, prefix) = object_store::parse_url_opts(&url, options)?;
    let location = probe_location(&prefix);

    let outcome = head(store.as_ref(), &location).await;
    PROBES.with_label_values(&[outcome.label()]).inc();
    match &outcome {
        ProbeOutcome::Denied(reason) => warn!(%location, %reason, "Probe rejected"),
        _ => debug!(%location, outcome = outcome.label(), "Probe authenticated"),
    }
    Ok(outcome)
}

/// Returns true if the options authenticate against `bucket_url`.
pub async fn can_connect(bucket_url: &str, options: &ObjectStoreOptions) -> bool {
    match check_connectivity(bucket_url, options).await {
        Ok(outcome) => outcome.is_authenticated(),
        Err(e) => {
            warn!(error = %e, "Probe could not be started");
            false
        }
    }
}

fn probe_location(prefix: &Path) -> Path {
    prefix.child(PROBE_OBJECT)
}

async fn head(store: &dyn ObjectStore, location: &Path) -> ProbeOutcome {
    match store.head(location).await {
        Ok(_) => ProbeOutcome::Found,
        Err(object_store::Error::NotFound { .. }) => ProbeOutcome::NotFound,
        Err(e) => ProbeOutcome::Denied(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;
    use object_store::PutPayload;

    #[test]
    fn test_probe_location_under_prefix() {
        assert_eq!(
            probe_location(&Path::from("tables/events")).as_ref(),
            "tables/events/_objstore_creds_probe"
        );
        assert_eq!(probe_location(&Path::default()).as_ref(), PROBE_OBJECT);
    }

    #[tokio::test]
    async fn test_head_outcomes() {
        let store = InMemory::new();
        let location = Path::from(PROBE_OBJECT);
        assert_eq!(head(&store, &location).await, ProbeOutcome::NotFound);

        store
            .put(&location, PutPayload::from_static(b"x"))
            .await
            .unwrap();
        assert_eq!(head(&store, &location).await, ProbeOutcome::Found);
    }

    #[test]
    fn test_authenticated_outcomes() {
        assert!(ProbeOutcome::Found.is_authenticated());
        assert!(ProbeOutcome::NotFound.is_authenticated());
        assert!(!ProbeOutcome::Denied("403".into()).is_authenticated());
    }
}
