//! Client for the QR signing service.
//!
//! The service turns a plain URL into a signed, time-boxed QR image path.
//! Requests are authenticated with a static bearer token; a successful
//! answer is a text body starting with [`SIGNED_PATH_PREFIX`], which is
//! appended to the service base URL to form the image URL.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::NotifierError;

/// Prefix every signed path returned by the service must carry.
pub const SIGNED_PATH_PREFIX: &str = "/v1/qr?";

const SIGN_PATH: &str = "/v1/sign";
const MAX_ERROR_BODY_CHARS: usize = 160;

/// Signed, time-limited QR image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLink(String);

impl SignedLink {
    /// Wraps an already signed image URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Borrow the full image URL.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SignedLink {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Mints signed QR links for preview URLs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QrSigner: Send + Sync {
    /// Requests a signed QR link for `target`.
    async fn sign(&self, target: &str) -> Result<SignedLink, NotifierError>;
}

/// Configuration for [`QrSigningClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct QrSigningConfig {
    /// Service base URL, e.g. `https://qr-code-generator.example.dev`.
    pub base_url: String,
    /// Bearer token presented to the service.
    pub mint_token: String,
    /// Requested lifetime of each signed link.
    pub ttl: Duration,
    /// HTTP timeout.
    pub timeout: Duration,
}

impl fmt::Debug for QrSigningConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("QrSigningConfig")
            .field("base_url", &self.base_url)
            .field("mint_token", &"<redacted>")
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP implementation of [`QrSigner`].
#[derive(Debug, Clone)]
pub struct QrSigningClient {
    config: QrSigningConfig,
    base_url: String,
    client: Client,
}

impl QrSigningClient {
    /// Creates a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::InvalidUrl`] when the base URL does not
    /// parse, or [`NotifierError::Configuration`] when the HTTP client
    /// cannot be built.
    pub fn new(config: QrSigningConfig) -> Result<Self, NotifierError> {
        Url::parse(&config.base_url)
            .map_err(|error| NotifierError::InvalidUrl(format!("{}: {error}", config.base_url)))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| NotifierError::Configuration {
                message: format!("failed to configure QR HTTP client: {error}"),
            })?;
        let base_url = config.base_url.trim_end_matches('/').to_owned();

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    fn sign_url(&self, target: &str) -> Result<Url, NotifierError> {
        let mut endpoint = Url::parse(&format!("{}{SIGN_PATH}", self.base_url))
            .map_err(|error| NotifierError::InvalidUrl(error.to_string()))?;
        endpoint
            .query_pairs_mut()
            .append_pair("u", target)
            .append_pair("ttl", &self.config.ttl.as_secs().to_string());
        Ok(endpoint)
    }
}

#[async_trait]
impl QrSigner for QrSigningClient {
    async fn sign(&self, target: &str) -> Result<SignedLink, NotifierError> {
        let endpoint = self.sign_url(target)?;

        let response = self
            .client
            .get(endpoint)
            .bearer_auth(&self.config.mint_token)
            .send()
            .await
            .map_err(|error| NotifierError::Network {
                message: format!("QR sign request transport failed: {error}"),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| NotifierError::Network {
                message: format!("QR sign response could not be read: {error}"),
            })?;

        if !status.is_success() {
            return Err(NotifierError::SigningService {
                message: format!(
                    "sign endpoint returned status {}: {}",
                    status.as_u16(),
                    truncate_for_message(&body, MAX_ERROR_BODY_CHARS)
                ),
            });
        }

        let signed_path = body.trim();
        if !signed_path.starts_with(SIGNED_PATH_PREFIX) {
            return Err(NotifierError::SigningService {
                message: format!(
                    "unexpected sign response: {}",
                    truncate_for_message(signed_path, MAX_ERROR_BODY_CHARS)
                ),
            });
        }

        Ok(SignedLink(format!("{}{signed_path}", self.base_url)))
    }
}

fn truncate_for_message(message: &str, max_chars: usize) -> String {
    let mut output = String::new();
    let mut chars = message.chars();

    for _ in 0..max_chars {
        let Some(character) = chars.next() else {
            return output;
        };
        output.push(character);
    }

    if chars.next().is_some() {
        output.push_str("...");
    }

    output
}
