//! Signed app assertions (JWTs) used to request installation tokens.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NotifierError;

use super::credential::AppCredential;

/// How far `iat` is backdated to tolerate clock drift against GitHub.
pub const CLOCK_SKEW_SECONDS: i64 = 30;

/// Span from `iat` to `exp`; GitHub refuses anything longer than ten minutes.
///
/// The span starts at the backdated `iat`, so an assertion minted at `now`
/// expires [`ASSERTION_LIFETIME_SECONDS`] minus [`CLOCK_SKEW_SECONDS`] after
/// `now`.
pub const ASSERTION_LIFETIME_SECONDS: i64 = 600;

/// Claims carried by an app assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Issued-at (unix timestamp seconds).
    pub iat: i64,
    /// Expiry (unix timestamp seconds).
    pub exp: i64,
    /// GitHub App identifier.
    pub iss: String,
    /// Unique token identifier.
    pub jti: String,
}

impl AssertionClaims {
    /// Builds claims for the given app at `now`.
    ///
    /// `iat` is backdated by [`CLOCK_SKEW_SECONDS`] and `exp` sits exactly
    /// [`ASSERTION_LIFETIME_SECONDS`] after it.
    #[must_use]
    pub fn issue(app_id: &str, now: DateTime<Utc>) -> Self {
        let issued_at = now - Duration::seconds(CLOCK_SKEW_SECONDS);
        let expires_at = issued_at + Duration::seconds(ASSERTION_LIFETIME_SECONDS);
        Self {
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: app_id.to_owned(),
            jti: Uuid::new_v4().simple().to_string(),
        }
    }
}

/// A signed, single-use app assertion.
#[derive(Clone, PartialEq, Eq)]
pub struct AppAssertion(String);

impl AppAssertion {
    /// Borrow the encoded JWT.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AppAssertion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("AppAssertion(<redacted>)")
    }
}

/// Signs an RS256 assertion for the credential's app.
///
/// # Errors
///
/// Returns [`NotifierError::Credential`] when the private key is not a
/// usable RSA PEM or signing fails.
pub fn mint_assertion(
    credential: &AppCredential,
    now: DateTime<Utc>,
) -> Result<AppAssertion, NotifierError> {
    let key = EncodingKey::from_rsa_pem(credential.private_key_pem().as_bytes()).map_err(
        |error| NotifierError::Credential {
            message: format!("private key is not a usable RSA PEM: {error}"),
        },
    )?;
    let claims = AssertionClaims::issue(credential.app_id(), now);

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map(AppAssertion)
        .map_err(|error| NotifierError::Credential {
            message: format!("signing app assertion failed: {error}"),
        })
}
