//! Read-only access to the Kubernetes cluster.
//!
//! Three collaborators live here: the listing of preview deployment
//! resources, the secret holding the GitHub App credential, and the
//! configuration map naming the base domain. The reconciliation loop and the
//! token broker depend on the traits, so tests substitute mocks; the
//! [`KubeCluster`] type implements both traits against a live API server.

mod application;
mod client;

use async_trait::async_trait;

use crate::error::NotifierError;
use crate::github::AppCredential;
use crate::preview::PreviewResource;

pub use application::decode_application;
pub use client::{
    APPLICATION_GROUP, APPLICATION_KIND, APPLICATION_PLURAL, APPLICATION_VERSION, KubeCluster,
    credential_from_secret, domain_from_config_map, resolve_config,
};

/// One entry of a resource listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListedResource {
    /// The resource decoded into the typed preview shape.
    Preview(PreviewResource),
    /// The resource body did not decode; it is skipped for this tick.
    Malformed {
        /// Resource name, or `<unnamed>` when metadata lacks one.
        name: String,
        /// Decoder diagnostic.
        reason: String,
    },
}

/// Lists preview deployment resources.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceLister: Send + Sync {
    /// Lists every resource of the watched kind, in listing order.
    async fn list_previews(&self) -> Result<Vec<ListedResource>, NotifierError>;
}

/// Reads GitHub App credential material.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Reads the credential afresh from the secret store.
    async fn app_credential(&self) -> Result<AppCredential, NotifierError>;
}
