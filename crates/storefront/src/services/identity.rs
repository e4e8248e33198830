//! Identity provider contract.

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Wrong email/password, unknown or disabled account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Too many attempts.
    #[error("too many sign-in attempts")]
    TooManyAttempts,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an unexpected error.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A signed-in caller.
#[derive(Debug, Clone)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    /// Role claims attached to the account by the provider.
    pub roles: Vec<String>,
    /// Short-lived provider token authorizing catalog writes on the
    /// caller's behalf.
    pub id_token: SecretString,
}

/// Verifies credentials against the hosted identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an email and password for an identity.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;
}
