//! Process configuration loaded from CLI, environment, and files.
//!
//! Values are merged using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in defaults matching the standard preview
//!    deployment
//! 2. **Configuration file** – `.preview-notifier.toml` in the current
//!    directory, home directory, or XDG config directory
//! 3. **Environment variables** – `PREVIEW_NOTIFIER_*`, plus the legacy
//!    `QR_MINT_TOKEN`
//! 4. **Command-line arguments** – `--namespace`, `--poll-interval-seconds`,
//!    and so on
//!
//! # Configuration File
//!
//! ```toml
//! namespace = "glueops-core"
//! github_app_secret_name = "tenant-repo-creds"
//! domain_config_map = "glueops-captain-domain"
//! poll_interval_seconds = 10
//! qr_ttl_seconds = 600
//! ```

use std::env;
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::error::NotifierError;

const DEFAULT_NAMESPACE: &str = "glueops-core";
const DEFAULT_GITHUB_APP_SECRET_NAME: &str = "tenant-repo-creds";
const DEFAULT_DOMAIN_CONFIG_MAP: &str = "glueops-captain-domain";
const DEFAULT_DOMAIN_CONFIG_KEY: &str = "captain_domain";
const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 10;
const DEFAULT_QR_TTL_SECONDS: u64 = 600;
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 15;
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_GITHUB_API_VERSION: &str = "2022-11-28";
const DEFAULT_LOG_FORMAT: &str = "json";

/// Legacy environment variable carrying the QR service bearer token.
pub const LEGACY_QR_MINT_TOKEN_ENV: &str = "QR_MINT_TOKEN";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable text.
    Text,
}

impl FromStr for LogFormat {
    type Err = NotifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" | "pretty" => Ok(Self::Text),
            other => Err(NotifierError::Configuration {
                message: format!("unsupported log format '{other}' (expected json or text)"),
            }),
        }
    }
}

/// Notifier configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `PREVIEW_NOTIFIER_NAMESPACE`: namespace holding the secret and config map
/// - `PREVIEW_NOTIFIER_GITHUB_APP_SECRET_NAME`: GitHub App secret name
/// - `PREVIEW_NOTIFIER_DOMAIN_CONFIG_MAP`: config map naming the base domain
/// - `PREVIEW_NOTIFIER_POLL_INTERVAL_SECONDS`: delay between reconciliation ticks
/// - `PREVIEW_NOTIFIER_QR_MINT_TOKEN` or `QR_MINT_TOKEN`: QR service bearer token
/// - `PREVIEW_NOTIFIER_QR_TTL_SECONDS`: lifetime of signed QR links
/// - `PREVIEW_NOTIFIER_HTTP_TIMEOUT_SECONDS`: per-call HTTP timeout
/// - `PREVIEW_NOTIFIER_GITHUB_API_VERSION`: `X-GitHub-Api-Version` header value
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "PREVIEW_NOTIFIER",
    discovery(
        dotfile_name = ".preview-notifier.toml",
        config_file_name = "preview-notifier.toml",
        app_name = "preview-notifier"
    )
)]
pub struct NotifierConfig {
    /// Namespace holding the GitHub App secret and the domain config map.
    #[ortho_config()]
    pub namespace: String,

    /// Name of the secret carrying GitHub App credential material.
    #[ortho_config()]
    pub github_app_secret_name: String,

    /// Name of the config map naming the base domain.
    #[ortho_config()]
    pub domain_config_map: String,

    /// Key inside the config map whose value is the base domain.
    #[ortho_config()]
    pub domain_config_key: String,

    /// Delay between reconciliation ticks, in seconds.
    #[ortho_config()]
    pub poll_interval_seconds: u64,

    /// Bearer token presented to the QR signing service.
    ///
    /// Required. Falls back to the legacy `QR_MINT_TOKEN` environment
    /// variable when unset.
    #[ortho_config()]
    pub qr_mint_token: Option<String>,

    /// Lifetime of each signed QR link, in seconds.
    #[ortho_config()]
    pub qr_ttl_seconds: u64,

    /// Overrides the QR service base URL derived from the base domain.
    #[ortho_config()]
    pub qr_service_url: Option<String>,

    /// Timeout applied to each outbound call, in seconds.
    #[ortho_config()]
    pub http_timeout_seconds: u64,

    /// GitHub REST API base URL.
    #[ortho_config()]
    pub github_api_url: String,

    /// Value sent in the `X-GitHub-Api-Version` header.
    #[ortho_config()]
    pub github_api_version: String,

    /// Log output format, `json` or `text`.
    #[ortho_config()]
    pub log_format: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            github_app_secret_name: DEFAULT_GITHUB_APP_SECRET_NAME.to_owned(),
            domain_config_map: DEFAULT_DOMAIN_CONFIG_MAP.to_owned(),
            domain_config_key: DEFAULT_DOMAIN_CONFIG_KEY.to_owned(),
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            qr_mint_token: None,
            qr_ttl_seconds: DEFAULT_QR_TTL_SECONDS,
            qr_service_url: None,
            http_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
            github_api_url: DEFAULT_GITHUB_API_URL.to_owned(),
            github_api_version: DEFAULT_GITHUB_API_VERSION.to_owned(),
            log_format: DEFAULT_LOG_FORMAT.to_owned(),
        }
    }
}

impl NotifierConfig {
    /// Resolves the QR mint token from configuration or the legacy
    /// `QR_MINT_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Configuration`] when no source provides a
    /// non-blank value.
    pub fn resolve_qr_mint_token(&self) -> Result<String, NotifierError> {
        self.qr_mint_token
            .clone()
            .or_else(|| env::var(LEGACY_QR_MINT_TOKEN_ENV).ok())
            .map(|token| token.trim().to_owned())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| NotifierError::Configuration {
                message: "missing QR mint token (set PREVIEW_NOTIFIER_QR_MINT_TOKEN or QR_MINT_TOKEN)"
                    .to_owned(),
            })
    }

    /// Parses the configured log format.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Configuration`] for unknown formats.
    pub fn log_format(&self) -> Result<LogFormat, NotifierError> {
        self.log_format.parse()
    }

    /// Checks numeric settings and required names.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Configuration`] when a duration is zero or a
    /// required name is blank.
    pub fn validate(&self) -> Result<(), NotifierError> {
        require_positive("poll_interval_seconds", self.poll_interval_seconds)?;
        require_positive("qr_ttl_seconds", self.qr_ttl_seconds)?;
        require_positive("http_timeout_seconds", self.http_timeout_seconds)?;
        require_non_blank("namespace", &self.namespace)?;
        require_non_blank("github_app_secret_name", &self.github_app_secret_name)?;
        require_non_blank("domain_config_map", &self.domain_config_map)?;
        require_non_blank("domain_config_key", &self.domain_config_key)?;
        require_non_blank("github_api_version", &self.github_api_version)?;
        Ok(())
    }

    /// Returns the delay between reconciliation ticks.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Returns the timeout applied to each outbound call.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

fn require_positive(field: &str, value: u64) -> Result<(), NotifierError> {
    if value == 0 {
        return Err(NotifierError::Configuration {
            message: format!("{field} must be greater than zero"),
        });
    }
    Ok(())
}

fn require_non_blank(field: &str, value: &str) -> Result<(), NotifierError> {
    if value.trim().is_empty() {
        return Err(NotifierError::Configuration {
            message: format!("{field} must not be blank"),
        });
    }
    Ok(())
}
