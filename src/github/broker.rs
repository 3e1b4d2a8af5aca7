//! Exchange of app assertions for installation access tokens.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::cluster::CredentialStore;
use crate::error::NotifierError;

use super::assertion::{AppAssertion, mint_assertion};
use super::client::{GitHubApiSettings, build_octocrab_client};
use super::error_mapping::map_octocrab_error;

/// Short-lived token scoped to one GitHub App installation.
#[derive(Clone, PartialEq, Eq)]
pub struct InstallationToken(String);

impl InstallationToken {
    /// Wraps a token value, rejecting blanks.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Api`] when the value is empty.
    pub fn new(value: impl AsRef<str>) -> Result<Self, NotifierError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(NotifierError::Api {
                message: "GitHub response missing token".to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for InstallationToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("InstallationToken(<redacted>)")
    }
}

/// Source of installation tokens for publishing comments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstallationTokenSource: Send + Sync {
    /// Obtains a fresh installation token.
    async fn installation_token(&self) -> Result<InstallationToken, NotifierError>;
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Brokers installation tokens from GitHub App credentials.
///
/// Every call reads the credential afresh, mints a new assertion, and
/// exchanges it; nothing is reused between notifications.
pub struct GitHubAppTokenBroker {
    credentials: Arc<dyn CredentialStore>,
    settings: GitHubApiSettings,
}

impl GitHubAppTokenBroker {
    /// Creates a broker reading credentials from `credentials`.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialStore>, settings: GitHubApiSettings) -> Self {
        Self {
            credentials,
            settings,
        }
    }

    async fn exchange(
        &self,
        assertion: &AppAssertion,
        installation_id: &str,
    ) -> Result<InstallationToken, NotifierError> {
        let client =
            build_octocrab_client(&self.settings, format!("Bearer {}", assertion.value()))?;
        let route = format!("/app/installations/{installation_id}/access_tokens");

        let response: AccessTokenResponse = client
            .post(route, None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("installation token exchange", &error))?;

        InstallationToken::new(response.token.unwrap_or_default())
    }
}

#[async_trait]
impl InstallationTokenSource for GitHubAppTokenBroker {
    async fn installation_token(&self) -> Result<InstallationToken, NotifierError> {
        let credential = self.credentials.app_credential().await?;
        let assertion = mint_assertion(&credential, Utc::now())?;
        let token = self
            .exchange(&assertion, credential.installation_id())
            .await?;
        tracing::debug!(
            installation_id = credential.installation_id(),
            "obtained installation token"
        );
        Ok(token)
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
