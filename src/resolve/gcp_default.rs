//! GCP application-default credential discovery.
//!
//! Discovery reads the key file named by `GOOGLE_APPLICATION_CREDENTIALS`,
//! falling back to the gcloud well-known file. A failed attempt is remembered
//! and further attempts within the cooldown fail fast, so a process without
//! default credentials does not hit the filesystem on every connection.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::credentials::gcp::GcpDefaultMaterial;
use crate::errors::{CredentialsError, Result};
use crate::metrics::DEFAULT_CREDENTIAL_SKIPS;

pub const GOOGLE_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const GOOGLE_CLOUD_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";

const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// Default credential discovery with a failure cooldown.
///
/// The last failure is an epoch-millisecond timestamp (`0` = none) stored
/// atomically; the resolver is shared by reference across callers.
#[derive(Debug)]
pub struct GcpDefaultResolver {
    cooldown: Duration,
    last_failure_ms: AtomicI64,
}

impl GcpDefaultResolver {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_failure_ms: AtomicI64::new(0),
        }
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Time of the last failed attempt, if any.
    #[must_use]
    pub fn last_failure(&self) -> Option<DateTime<Utc>> {
        match self.last_failure_ms.load(Ordering::Acquire) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }

    /// Forgets the last failure so the next call attempts discovery.
    pub fn reset(&self) {
        self.last_failure_ms.store(0, Ordering::Release);
    }

    /// Discovers default credential material.
    ///
    /// `project_id`, else `GOOGLE_CLOUD_PROJECT`, stands in for a
    /// service-account key file without one.
    pub fn resolve<F>(
        &self,
        env: F,
        now: DateTime<Utc>,
        project_id: Option<&str>,
    ) -> Result<GcpDefaultMaterial>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(failed_at) = self.last_failure() {
            if now.signed_duration_since(failed_at) < self.cooldown {
                DEFAULT_CREDENTIAL_SKIPS.inc();
                debug!(%failed_at, "Skipping GCP default credentials, recent attempt failed");
                return Err(CredentialsError::defaults_unavailable(format!(
                    "last attempt failed at {failed_at}, retrying after a {}s cooldown",
                    self.cooldown.num_seconds()
                )));
            }
        }

        match Self::discover(&env, project_id) {
            Ok(material) => Ok(material),
            Err(e) => {
                self.last_failure_ms
                    .store(now.timestamp_millis().max(1), Ordering::Release);
                warn!(error = %e, "GCP default credentials unavailable");
                Err(match e {
                    CredentialsError::DefaultCredentialsUnavailable(_) => e,
                    other => CredentialsError::defaults_unavailable(other.to_string()),
                })
            }
        }
    }

    fn discover<F>(env: &F, project_id: Option<&str>) -> Result<GcpDefaultMaterial>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = Self::credentials_path(env).ok_or_else(|| {
            CredentialsError::defaults_unavailable(format!(
                "`{GOOGLE_APPLICATION_CREDENTIALS}` is not set and no gcloud \
                 application default credentials were found"
            ))
        })?;
        debug!(path = %path.display(), "Reading GCP default credentials");
        let content = std::fs::read_to_string(&path)?;
        let project_id = project_id
            .map(str::to_string)
            .or_else(|| env(GOOGLE_CLOUD_PROJECT).filter(|v| !v.trim().is_empty()));
        GcpDefaultMaterial::from_json(&content, project_id.as_deref())
    }

    fn credentials_path<F>(env: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty(GOOGLE_APPLICATION_CREDENTIALS) {
            return Some(PathBuf::from(path));
        }

        let config_dir = non_empty("CLOUDSDK_CONFIG")
            .map(PathBuf::from)
            .or_else(|| non_empty("HOME").map(|home| PathBuf::from(home).join(".config/gcloud")))?;
        let well_known = config_dir.join(WELL_KNOWN_FILE);
        well_known.is_file().then_some(well_known)
    }
}
