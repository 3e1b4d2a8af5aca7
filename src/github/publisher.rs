//! Posting of preview notifications to pull request conversations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NotifierError;

use super::broker::InstallationToken;
use super::client::{GitHubApiSettings, build_octocrab_client};
use super::error_mapping::map_octocrab_error;
use super::review::ReviewTarget;

/// Comment created on the pull request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishedComment {
    /// Comment identifier.
    pub id: u64,
    /// Browser URL of the comment, when GitHub reports one.
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Publishes rendered notification bodies.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentPublisher: Send + Sync {
    /// Posts `body` as a new conversation comment on `target`.
    async fn publish(
        &self,
        target: &ReviewTarget,
        token: &InstallationToken,
        body: &str,
    ) -> Result<PublishedComment, NotifierError>;
}

#[derive(Debug, Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

/// Octocrab-backed publisher using installation token authentication.
#[derive(Debug, Clone)]
pub struct OctocrabCommentPublisher {
    settings: GitHubApiSettings,
}

impl OctocrabCommentPublisher {
    /// Creates a publisher for the given API settings.
    #[must_use]
    pub const fn new(settings: GitHubApiSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl CommentPublisher for OctocrabCommentPublisher {
    async fn publish(
        &self,
        target: &ReviewTarget,
        token: &InstallationToken,
        body: &str,
    ) -> Result<PublishedComment, NotifierError> {
        let client = build_octocrab_client(&self.settings, format!("token {}", token.value()))?;

        client
            .post(target.comments_path(), Some(&CommentRequest { body }))
            .await
            .map_err(|error| map_octocrab_error("post pull request comment", &error))
    }
}
