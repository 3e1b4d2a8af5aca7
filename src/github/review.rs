//! Identity wrappers for the pull request a preview belongs to.

use thiserror::Error;

/// Defects in the review-context annotations of a preview.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewMetadataError {
    /// The repository owner annotation is missing or empty.
    #[error("repository owner is missing")]
    MissingOwner,

    /// The repository name annotation is missing or empty.
    #[error("repository name is missing")]
    MissingRepository,

    /// The pull request number annotation is missing or empty.
    #[error("pull request number is missing")]
    MissingPullRequestNumber,

    /// The pull request number is not a positive integer.
    #[error("pull request number must be a positive integer, got '{0}'")]
    InvalidPullRequestNumber(String),

    /// An owner or repository value cannot form a single path segment.
    #[error("'{0}' is not a valid repository path segment")]
    InvalidSegment(String),
}

/// Repository owner wrapper to avoid stringly typed parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOwner(String);

impl RepositoryOwner {
    pub(crate) fn new(value: &str) -> Result<Self, ReviewMetadataError> {
        if value.is_empty() {
            return Err(ReviewMetadataError::MissingOwner);
        }
        require_segment(value)?;
        Ok(Self(value.to_owned()))
    }

    /// Borrow the owner value.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Repository name wrapper to prevent parameter mix-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub(crate) fn new(value: &str) -> Result<Self, ReviewMetadataError> {
        if value.is_empty() {
            return Err(ReviewMetadataError::MissingRepository);
        }
        require_segment(value)?;
        Ok(Self(value.to_owned()))
    }

    /// Borrow the repository name.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Pull request number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullRequestNumber(u64);

impl PullRequestNumber {
    pub(crate) fn parse(value: &str) -> Result<Self, ReviewMetadataError> {
        if value.is_empty() {
            return Err(ReviewMetadataError::MissingPullRequestNumber);
        }
        match value.trim().parse::<u64>() {
            Ok(number) if number > 0 => Ok(Self(number)),
            _ => Err(ReviewMetadataError::InvalidPullRequestNumber(
                value.to_owned(),
            )),
        }
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

fn require_segment(value: &str) -> Result<(), ReviewMetadataError> {
    if value.contains(['/', '?', '#']) || value == "." || value == ".." {
        return Err(ReviewMetadataError::InvalidSegment(value.to_owned()));
    }
    Ok(())
}

/// Pull request that receives the preview notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewTarget {
    owner: RepositoryOwner,
    repository: RepositoryName,
    number: PullRequestNumber,
}

impl ReviewTarget {
    /// Validates raw annotation values.
    ///
    /// Values are checked in the order owner, repository, number so the
    /// first defect is the one reported.
    ///
    /// # Errors
    ///
    /// Returns a [`ReviewMetadataError`] describing the first missing or
    /// malformed value.
    pub fn new(
        raw_owner: Option<&str>,
        raw_repository: Option<&str>,
        raw_number: Option<&str>,
    ) -> Result<Self, ReviewMetadataError> {
        Ok(Self {
            owner: RepositoryOwner::new(raw_owner.unwrap_or_default())?,
            repository: RepositoryName::new(raw_repository.unwrap_or_default())?,
            number: PullRequestNumber::parse(raw_number.unwrap_or_default())?,
        })
    }

    /// Repository owner.
    #[must_use]
    pub const fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryName {
        &self.repository
    }

    /// Pull request number.
    #[must_use]
    pub const fn number(&self) -> PullRequestNumber {
        self.number
    }

    /// API path for the pull request's conversation comments.
    #[must_use]
    pub fn comments_path(&self) -> String {
        format!(
            "/repos/{}/{}/issues/{}/comments",
            self.owner.as_str(),
            self.repository.as_str(),
            self.number.get()
        )
    }
}
