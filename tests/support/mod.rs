//! Shared test utilities.

use std::time::Duration;

use async_trait::async_trait;
use kube::api::DynamicObject;
use preview_notifier::cluster::decode_application;
use preview_notifier::github::AppCredential;
use preview_notifier::{
    CredentialStore, GitHubApiSettings, ListedResource, NotifierError, ResourceLister,
};
use serde_json::json;

/// RSA key used to sign app assertions in tests.
pub const APP_PRIVATE_KEY: &str = include_str!("../fixtures/app_key_pkcs1.pem");

/// Installation identifier served by [`StaticCredentials`].
pub const INSTALLATION_ID: &str = "99";

/// Lister that returns the same resources on every tick.
pub struct StaticLister {
    resources: Vec<ListedResource>,
}

impl StaticLister {
    pub fn new(resources: Vec<ListedResource>) -> Self {
        Self { resources }
    }
}

#[async_trait]
impl ResourceLister for StaticLister {
    async fn list_previews(&self) -> Result<Vec<ListedResource>, NotifierError> {
        Ok(self.resources.clone())
    }
}

/// Credential store holding the test app key.
pub struct StaticCredentials;

#[async_trait]
impl CredentialStore for StaticCredentials {
    async fn app_credential(&self) -> Result<AppCredential, NotifierError> {
        AppCredential::new("4242", INSTALLATION_ID, APP_PRIVATE_KEY)
    }
}

/// GitHub settings pointing at a mock server.
pub fn github_settings(api_base: String) -> GitHubApiSettings {
    GitHubApiSettings {
        api_base,
        api_version: "2022-11-28".to_owned(),
        timeout: Duration::from_secs(5),
    }
}

/// Decodes a ready preview application exposing `external_urls`.
///
/// # Panics
///
/// Panics if the fixture JSON is not a valid object.
pub fn ready_application(external_urls: &[&str]) -> ListedResource {
    let object: DynamicObject = serde_json::from_value(json!({
        "apiVersion": "argoproj.io/v1alpha1",
        "kind": "Application",
        "metadata": {
            "name": "web-pr-7",
            "annotations": {
                "preview_environment": "true",
                "head_sha": "abc123",
                "repository_organization": "acme",
                "repository_name": "web",
                "pull_request_number": "7"
            },
            "ownerReferences": [{
                "apiVersion": "argoproj.io/v1alpha1",
                "kind": "ApplicationSet",
                "name": "previews",
                "uid": "1b4e28ba-2fa1-11d2-883f-0016d3cca427"
            }]
        },
        "spec": { "destination": { "namespace": "web-pr-7" } },
        "status": {
            "sync": { "revision": "abc123" },
            "health": { "status": "Healthy" },
            "summary": { "externalURLs": external_urls }
        }
    }))
    .unwrap_or_else(|error| panic!("invalid application fixture: {error}"));
    decode_application(object)
}
