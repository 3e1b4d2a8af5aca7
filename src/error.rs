//! Error types surfaced by the preview notifier.

use thiserror::Error;

/// Errors raised while configuring the notifier or reconciling previews.
///
/// Whether an error is fatal depends on where it surfaces: during startup
/// every variant stops the process, while inside the reconciliation loop
/// they are logged and the affected resource is retried on the next tick.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifierError {
    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// The Kubernetes API could not be reached or returned an error.
    #[error("cluster error: {message}")]
    Cluster {
        /// Details about the cluster failure.
        message: String,
    },

    /// GitHub App credential material was missing or unusable.
    #[error("credential error: {message}")]
    Credential {
        /// Details about the credential failure.
        message: String,
    },

    /// GitHub rejected the presented credential.
    #[error("GitHub rejected the credential: {message}")]
    Authentication {
        /// GitHub error message returned with the 401/403 response.
        message: String,
    },

    /// GitHub returned a non-authentication API error.
    #[error("GitHub API error: {message}")]
    Api {
        /// Response detail describing the failure.
        message: String,
    },

    /// Networking failed while calling an external service.
    #[error("network error: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// The QR signing service failed or answered with an unexpected shape.
    #[error("QR signing service error: {message}")]
    SigningService {
        /// Details about the signing failure.
        message: String,
    },

    /// The notification body could not be rendered.
    #[error("comment rendering failed: {message}")]
    Render {
        /// Template engine error detail.
        message: String,
    },

    /// A URL could not be parsed or constructed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// An external call did not complete within its time budget.
    #[error("{operation} timed out")]
    Timeout {
        /// The operation that exceeded its timeout.
        operation: String,
    },
}
