//! Prometheus metrics for objstore-creds
//!
//! Defines metrics for:
//! - Credential resolutions by mode and outcome
//! - Translations into `object_store` options by provider and outcome
//! - GCP default-credential attempts skipped by the failure cooldown
//! - AWS session token exchanges
//! - Connectivity probe outcomes

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    /// Registry for all metrics
    pub static ref REGISTRY: Registry = Registry::new();

    /// Credential resolutions by auth mode and outcome
    pub static ref RESOLUTIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("objstore_creds_resolutions_total", "Total credential resolutions"),
        &["mode", "outcome"]
    )
    .expect("Failed to create RESOLUTIONS metric");

    /// Translations by provider and outcome
    pub static ref TRANSLATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("objstore_creds_translations_total", "Total object_store option translations"),
        &["provider", "outcome"]
    )
    .expect("Failed to create TRANSLATIONS metric");

    /// Default-credential attempts skipped during the failure cooldown
    pub static ref DEFAULT_CREDENTIAL_SKIPS: IntCounter = IntCounter::new(
        "objstore_creds_gcp_default_skips_total",
        "GCP default credential attempts skipped after a recent failure"
    )
    .expect("Failed to create DEFAULT_CREDENTIAL_SKIPS metric");

    /// Session token exchanges by status
    pub static ref SESSION_TOKEN_EXCHANGES: IntCounterVec = IntCounterVec::new(
        Opts::new("objstore_creds_session_token_exchanges_total", "Total AWS session token exchanges"),
        &["status"]
    )
    .expect("Failed to create SESSION_TOKEN_EXCHANGES metric");

    /// Connectivity probes by outcome
    pub static ref PROBES: IntCounterVec = IntCounterVec::new(
        Opts::new("objstore_creds_probes_total", "Total connectivity probes"),
        &["outcome"]
    )
    .expect("Failed to create PROBES metric");
}

/// Initialize metrics and register with the global registry
pub fn init_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(RESOLUTIONS.clone()))?;
    REGISTRY.register(Box::new(TRANSLATIONS.clone()))?;
    REGISTRY.register(Box::new(DEFAULT_CREDENTIAL_SKIPS.clone()))?;
    REGISTRY.register(Box::new(SESSION_TOKEN_EXCHANGES.clone()))?;
    REGISTRY.register(Box::new(PROBES.clone()))?;
    Ok(())
}

/// Render the registry in the Prometheus text exposition format
pub fn gather_text() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
