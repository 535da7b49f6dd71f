//! Connectivity probe: "not found" means authenticated, anything else does not.

use mockito::Matcher;
use url::Url;

use objstore_creds::probe::PROBE_OBJECT;
use objstore_creds::{
    can_connect, check_connectivity, AwsCredentials, Credentials, CredentialsError,
    ObjectStoreOptions, ProbeOutcome,
};

fn minio_options(endpoint: &str) -> ObjectStoreOptions {
    let creds: Credentials = AwsCredentials::without_defaults("minioadmin", "minioadmin")
        .region_name("us-east-1")
        .endpoint_url(endpoint)
        .build()
        .unwrap()
        .into();
    creds.to_object_store_options().unwrap()
}

#[tokio::test]
async fn memory_store_reports_not_found() {
    let outcome = check_connectivity("memory:///", &ObjectStoreOptions::new())
        .await
        .unwrap();
    assert_eq!(outcome, ProbeOutcome::NotFound);
    assert!(outcome.is_authenticated());
}

#[tokio::test]
async fn local_directory_found_and_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::from_directory_path(dir.path()).unwrap();

    let outcome = check_connectivity(url.as_str(), &ObjectStoreOptions::new())
        .await
        .unwrap();
    assert_eq!(outcome, ProbeOutcome::NotFound);

    std::fs::write(dir.path().join(PROBE_OBJECT), b"probe").unwrap();
    let outcome = check_connectivity(url.as_str(), &ObjectStoreOptions::new())
        .await
        .unwrap();
    assert_eq!(outcome, ProbeOutcome::Found);
}

#[tokio::test]
async fn invalid_url_is_an_error() {
    let err = check_connectivity("not a url", &ObjectStoreOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialsError::InvalidUrl(_)));
    assert!(!can_connect("not a url", &ObjectStoreOptions::new()).await);
}

#[tokio::test]
async fn s3_missing_object_means_authenticated() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("HEAD", Matcher::Regex(format!("^/bucket/.*{PROBE_OBJECT}$")))
        .with_status(404)
        .create_async()
        .await;

    let options = minio_options(&server.url());
    assert!(can_connect("s3://bucket/tables", &options).await);
    mock.assert_async().await;
}

#[tokio::test]
async fn s3_forbidden_means_denied() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("HEAD", Matcher::Any)
        .with_status(403)
        .create_async()
        .await;

    let options = minio_options(&server.url());
    let outcome = check_connectivity("s3://bucket", &options).await.unwrap();
    assert!(matches!(outcome, ProbeOutcome::Denied(_)));
    assert!(!outcome.is_authenticated());
}
