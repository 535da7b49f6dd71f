//! objstore-creds - resolve, translate and probe cloud credentials
//!
//! Builds the credential selected by configuration from the standard provider
//! environment variables, resolves it, prints the (redacted) `object_store`
//! options and, when a bucket URL is configured, checks that the options
//! authenticate against it.

use anyhow::{bail, Context};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use objstore_creds::config::CredentialKind;
use objstore_creds::{
    check_connectivity, metrics, AwsCredentials, AwsProfileLoader, AzureAccountKeyCredentials,
    AzureServicePrincipalCredentials, Config, CredentialResolver, Credentials,
    GcpDefaultCredentials, GcpServiceAccountCredentials, StsSessionTokenIssuer,
};

fn build_credentials(config: &Config, resolver: &CredentialResolver) -> anyhow::Result<Credentials> {
    let credentials = match config.probe.kind {
        CredentialKind::Aws => AwsCredentials::with_defaults().build()?.into(),
        CredentialKind::Azure => AzureAccountKeyCredentials::from_env(resolver)?.into(),
        CredentialKind::AzureServicePrincipal => {
            AzureServicePrincipalCredentials::from_env(resolver)?.into()
        }
        CredentialKind::Gcp => {
            let path = config
                .probe
                .service_account_file
                .as_deref()
                .context("`service_account_file` is required for gcp credentials")?;
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading service account key {path}"))?;
            GcpServiceAccountCredentials::from_json(&json)?.into()
        }
        CredentialKind::GcpDefault => GcpDefaultCredentials::new().into(),
    };
    Ok(credentials)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment and optional config file
    let config = Config::from_env()?;

    // Initialize tracing with JSON output for structured logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    metrics::init_metrics()?;

    info!(?config, "Configuration loaded");

    let resolver = CredentialResolver::from_config(&config.resolver)?;
    let mut credentials = match resolver.resolve(build_credentials(&config, &resolver)?)? {
        Credentials::Aws(aws) => aws.load_profile(&AwsProfileLoader::new()).await?.into(),
        other => other,
    };
    info!(mode = credentials.mode(), provider = %credentials.provider(), "Credentials resolved");

    if config.probe.exchange_session_token {
        if let Credentials::Aws(aws) = &credentials {
            let duration = config.resolver.session_token_duration()?;
            let session = aws
                .to_session_credentials(&StsSessionTokenIssuer::new(), duration)
                .await?;
            let follow_up = session.into_aws_credentials(aws.region_name(), aws.endpoint_url())?;
            credentials = follow_up.into();
        } else {
            warn!(mode = credentials.mode(), "Session token exchange only applies to AWS");
        }
    }

    let options = credentials.to_object_store_options()?;
    info!(%options, "object_store options");

    if let Some(bucket_url) = &config.probe.bucket_url {
        let outcome = check_connectivity(bucket_url, &options).await?;
        if !outcome.is_authenticated() {
            bail!("credentials rejected by {bucket_url}: {outcome:?}");
        }
        info!(%bucket_url, ?outcome, "Credentials authenticated");
    }

    debug!(metrics = %metrics::gather_text()?, "Metrics snapshot");
    Ok(())
}
