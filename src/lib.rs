//! Preview notifier library crate.
//!
//! Watches Argo CD applications that back pull request preview environments
//! and, once a preview is synced, healthy, and reachable, posts a comment on
//! the pull request with links to the preview, its QR codes, and its
//! dashboards. Each build revision is announced once per process lifetime.

pub mod cluster;
pub mod config;
pub mod dedup;
pub mod error;
pub mod gate;
pub mod github;
pub mod links;
pub mod preview;
pub mod qr;
pub mod reconcile;
pub mod render;
pub mod telemetry;

pub use cluster::{CredentialStore, KubeCluster, ListedResource, ResourceLister};
pub use config::{LogFormat, NotifierConfig};
pub use dedup::{InMemoryRevisionStore, RevisionStore};
pub use error::NotifierError;
pub use gate::{GateDecision, evaluate};
pub use github::{
    GitHubApiSettings, GitHubAppTokenBroker, InstallationTokenSource, OctocrabCommentPublisher,
};
pub use links::LinkBuilder;
pub use preview::PreviewResource;
pub use qr::{QrSigner, QrSigningClient, QrSigningConfig};
pub use reconcile::{Collaborators, Reconciler, TickReport};
pub use render::CommentRenderer;
