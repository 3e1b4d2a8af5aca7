//! Octocrab client construction shared by the broker and the publisher.

use std::time::Duration;

use http::Uri;
use http::header::{ACCEPT, AUTHORIZATION, HeaderName};
use octocrab::Octocrab;
use octocrab::service::middleware::retry::RetryConfig;

use crate::error::NotifierError;

use super::error_mapping::map_octocrab_error;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";

/// Connection settings for the GitHub REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubApiSettings {
    /// API base URL, `https://api.github.com` for github.com.
    pub api_base: String,
    /// Value of the `X-GitHub-Api-Version` header.
    pub api_version: String,
    /// Timeout applied to each request.
    pub timeout: Duration,
}

/// Builds an Octocrab client that sends `authorization` verbatim.
///
/// The header value carries its scheme (`Bearer` for app assertions,
/// `token` for installation tokens), so no Octocrab auth mode is used.
/// Octocrab's retry layer is disabled: every call is sent exactly once and a
/// failed step is retried by the next reconciliation tick.
///
/// # Errors
///
/// Returns `NotifierError::InvalidUrl` when the base URI cannot be parsed or
/// `NotifierError::Api` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    settings: &GitHubApiSettings,
    authorization: String,
) -> Result<Octocrab, NotifierError> {
    let base_uri: Uri = settings
        .api_base
        .parse::<Uri>()
        .map_err(|error| NotifierError::InvalidUrl(error.to_string()))?;

    Octocrab::builder()
        .base_uri(base_uri)
        .map_err(|error| NotifierError::Api {
            message: format!("build client failed: {error}"),
        })?
        .add_retry_config(RetryConfig::None)
        .add_header(AUTHORIZATION, authorization)
        .add_header(ACCEPT, GITHUB_MEDIA_TYPE.to_owned())
        .add_header(
            HeaderName::from_static(API_VERSION_HEADER),
            settings.api_version.clone(),
        )
        .set_connect_timeout(Some(settings.timeout))
        .set_read_timeout(Some(settings.timeout))
        .set_write_timeout(Some(settings.timeout))
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
