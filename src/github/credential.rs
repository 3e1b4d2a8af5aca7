//! GitHub App credential material read from the secret store.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::NotifierError;

/// Secret key holding the GitHub App identifier.
pub const APP_ID_KEY: &str = "githubAppID";
/// Secret key holding the installation identifier.
pub const INSTALLATION_ID_KEY: &str = "githubAppInstallationID";
/// Secret key holding the PEM-encoded RSA private key.
pub const PRIVATE_KEY_KEY: &str = "githubAppPrivateKey";

/// Application identity and signing key for one notification attempt.
///
/// Loaded fresh for every attempt and never cached.
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredential {
    app_id: String,
    installation_id: String,
    private_key_pem: String,
}

impl AppCredential {
    /// Validates and trims raw credential values.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Credential`] when a value is blank or the
    /// installation identifier is not numeric.
    pub fn new(
        app_id: &str,
        installation_id: &str,
        private_key_pem: &str,
    ) -> Result<Self, NotifierError> {
        let app_id = require_value(APP_ID_KEY, app_id)?;
        let installation_id = require_value(INSTALLATION_ID_KEY, installation_id)?;
        let private_key_pem = require_value(PRIVATE_KEY_KEY, private_key_pem)?;

        if !installation_id.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(NotifierError::Credential {
                message: format!("secret key '{INSTALLATION_ID_KEY}' must be numeric"),
            });
        }

        Ok(Self {
            app_id,
            installation_id,
            private_key_pem,
        })
    }

    /// Builds a credential from the raw data of a secret.
    ///
    /// # Errors
    ///
    /// Returns [`NotifierError::Credential`] when a key is missing, not
    /// UTF-8, or blank.
    pub fn from_secret_data(data: &BTreeMap<String, Vec<u8>>) -> Result<Self, NotifierError> {
        Self::new(
            secret_field(data, APP_ID_KEY)?,
            secret_field(data, INSTALLATION_ID_KEY)?,
            secret_field(data, PRIVATE_KEY_KEY)?,
        )
    }

    /// GitHub App identifier, used as the assertion issuer.
    #[must_use]
    pub const fn app_id(&self) -> &str {
        self.app_id.as_str()
    }

    /// Installation the access token is scoped to.
    #[must_use]
    pub const fn installation_id(&self) -> &str {
        self.installation_id.as_str()
    }

    /// PEM-encoded RSA private key (PKCS#1 or PKCS#8).
    #[must_use]
    pub const fn private_key_pem(&self) -> &str {
        self.private_key_pem.as_str()
    }
}

impl fmt::Debug for AppCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppCredential")
            .field("app_id", &self.app_id)
            .field("installation_id", &self.installation_id)
            .field("private_key_pem", &"<redacted>")
            .finish()
    }
}

fn secret_field<'data>(
    data: &'data BTreeMap<String, Vec<u8>>,
    key: &str,
) -> Result<&'data str, NotifierError> {
    let raw = data.get(key).ok_or_else(|| NotifierError::Credential {
        message: format!("secret missing key '{key}'"),
    })?;
    std::str::from_utf8(raw).map_err(|_| NotifierError::Credential {
        message: format!("secret key '{key}' is not valid UTF-8"),
    })
}

fn require_value(key: &str, value: &str) -> Result<String, NotifierError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(NotifierError::Credential {
            message: format!("secret key '{key}' is empty"),
        });
    }
    Ok(trimmed.to_owned())
}
