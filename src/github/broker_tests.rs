//! Tests for the installation token broker.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use super::{GitHubAppTokenBroker, InstallationTokenSource};
use crate::cluster::MockCredentialStore;
use crate::error::NotifierError;
use crate::github::assertion::AssertionClaims;
use crate::github::client::GitHubApiSettings;
use crate::github::credential::AppCredential;

const PKCS1_KEY: &str = include_str!("../../tests/fixtures/app_key_pkcs1.pem");
const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/app_key_public.pem");
const TOKEN_PATH: &str = "/app/installations/99/access_tokens";

fn settings(server: &MockServer) -> GitHubApiSettings {
    GitHubApiSettings {
        api_base: server.uri(),
        api_version: "2022-11-28".to_owned(),
        timeout: Duration::from_secs(5),
    }
}

fn credential_store() -> MockCredentialStore {
    let mut store = MockCredentialStore::new();
    store.expect_app_credential().times(1).returning(|| {
        AppCredential::new("4242", "99", PKCS1_KEY)
    });
    store
}

fn carries_valid_assertion(request: &Request) -> bool {
    let Some(value) = request
        .headers
        .get("authorization")
        .and_then(|raw| raw.to_str().ok())
    else {
        return false;
    };
    let Some(jwt) = value.strip_prefix("Bearer ") else {
        return false;
    };
    let Ok(key) = DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()) else {
        return false;
    };
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&["4242"]);
    jsonwebtoken::decode::<AssertionClaims>(jwt, &key, &validation).is_ok()
}

#[tokio::test]
async fn exchanges_signed_assertion_for_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("x-github-api-version", "2022-11-28"))
        .and(carries_valid_assertion)
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "ghs_installation",
            "expires_at": "2026-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let broker = GitHubAppTokenBroker::new(Arc::new(credential_store()), settings(&server));
    let token = broker
        .installation_token()
        .await
        .expect("exchange should succeed");

    assert_eq!(token.value(), "ghs_installation");
}

#[tokio::test]
async fn rejected_assertion_maps_to_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })),
        )
        .mount(&server)
        .await;

    let broker = GitHubAppTokenBroker::new(Arc::new(credential_store()), settings(&server));
    let result = broker.installation_token().await;

    assert!(
        matches!(result, Err(NotifierError::Authentication { .. })),
        "expected Authentication error, got {result:?}"
    );
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let broker = GitHubAppTokenBroker::new(Arc::new(credential_store()), settings(&server));
    let result = broker.installation_token().await;

    assert!(result.is_err(), "expected an error, got {result:?}");
    let exchanges = server.received_requests().await.unwrap_or_default().len();
    assert_eq!(exchanges, 1, "token exchange must be sent exactly once");
}

#[tokio::test]
async fn missing_token_field_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "token": "" })))
        .mount(&server)
        .await;

    let broker = GitHubAppTokenBroker::new(Arc::new(credential_store()), settings(&server));
    let result = broker.installation_token().await;

    assert!(
        matches!(result, Err(NotifierError::Api { .. })),
        "expected Api error, got {result:?}"
    );
}

#[tokio::test]
async fn credential_failure_skips_the_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut store = MockCredentialStore::new();
    store.expect_app_credential().times(1).returning(|| {
        Err(NotifierError::Credential {
            message: "secret missing key 'githubAppPrivateKey'".to_owned(),
        })
    });

    let broker = GitHubAppTokenBroker::new(Arc::new(store), settings(&server));
    let result = broker.installation_token().await;

    assert!(
        matches!(result, Err(NotifierError::Credential { .. })),
        "expected Credential error, got {result:?}"
    );
}
