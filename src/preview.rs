//! Typed view of a preview deployment resource.
//!
//! Resources are owned by the deployment controller and decoded into this
//! shape at the cluster boundary, so the readiness gate never touches raw
//! nested JSON.

use std::collections::BTreeMap;

/// Annotation marking a resource as a preview environment.
pub const PREVIEW_ENVIRONMENT_ANNOTATION: &str = "preview_environment";
/// Annotation carrying the commit the preview was built from.
pub const HEAD_SHA_ANNOTATION: &str = "head_sha";
/// Annotation carrying the repository name.
pub const REPOSITORY_NAME_ANNOTATION: &str = "repository_name";
/// Annotation carrying the repository owner.
pub const REPOSITORY_ORGANIZATION_ANNOTATION: &str = "repository_organization";
/// Annotation carrying the pull request number.
pub const PULL_REQUEST_NUMBER_ANNOTATION: &str = "pull_request_number";

/// One deployment resource as listed from the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewResource {
    /// Resource name.
    pub name: String,
    /// Names of the owning controllers; empty for hand-made resources.
    pub owners: Vec<String>,
    /// Resource annotations.
    pub annotations: BTreeMap<String, String>,
    /// Observed status.
    pub status: PreviewStatus,
}

/// Status snapshot reported by the deployment controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewStatus {
    /// Revisions the controller has synced.
    pub synced_revisions: Vec<String>,
    /// Free-form health classification such as `Healthy` or `Progressing`.
    pub health: Option<String>,
    /// Externally reachable URLs, blanks removed.
    pub external_urls: Vec<String>,
    /// Namespace the resource deploys into.
    pub destination_namespace: String,
}

impl PreviewResource {
    /// Returns a non-empty annotation value.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Returns true when at least one controller owns the resource.
    #[must_use]
    pub fn has_owner(&self) -> bool {
        !self.owners.is_empty()
    }
}
