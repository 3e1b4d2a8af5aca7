//! GitHub App authentication and pull request comment publishing.
//!
//! Credentials are exchanged for an installation token on every
//! notification: an RS256 app assertion is minted from the app's private
//! key, traded for a token at the installation endpoint, and the token is
//! then used to post the comment. Octocrab errors are mapped into
//! [`NotifierError`](crate::error::NotifierError) variants so callers can log
//! precise failures without depending on Octocrab internals.

pub mod assertion;
pub mod broker;
mod client;
pub mod credential;
mod error_mapping;
pub mod publisher;
pub mod review;

pub use assertion::{AppAssertion, AssertionClaims, mint_assertion};
pub use broker::{GitHubAppTokenBroker, InstallationToken, InstallationTokenSource};
pub use client::GitHubApiSettings;
pub use credential::AppCredential;
pub use publisher::{CommentPublisher, OctocrabCommentPublisher, PublishedComment};
pub use review::{
    PullRequestNumber, RepositoryName, RepositoryOwner, ReviewMetadataError, ReviewTarget,
};

#[cfg(test)]
pub use broker::MockInstallationTokenSource;
#[cfg(test)]
pub use publisher::MockCommentPublisher;
