//! Authentication middleware and extractors.
//!
//! Provides extractors for the signed-in user and for admin pages, which
//! need the configured admin role.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user carrying the admin role.
///
/// If nobody is signed in, returns a redirect to the login page (or 401 for
/// `/api/` paths). Signed-in users without the role get 403.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_handler(admin: RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.user.email)
/// }
/// ```
pub struct RequireAdmin {
    pub user: CurrentUser,
    /// Provider token for catalog writes.
    pub id_token: SecretString,
}

/// Error returned when authentication or authorization fails.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Signed in, but not allowed.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

fn missing_user(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or_else(|| missing_user(parts))?;

        if !user.has_role(&state.config().admin_role) {
            tracing::warn!(uid = %user.uid, path = %parts.uri.path(), "Admin access denied");
            return Err(AuthRejection::Forbidden);
        }

        // Sessions from before the token was stored sign in again.
        let id_token = match parts.extensions.get::<Session>() {
            Some(session) => admin_id_token(session).await,
            None => None,
        }
        .ok_or_else(|| missing_user(parts))?;

        Ok(Self { user, id_token })
    }
}

/// Extractor that optionally gets the current user.
///
/// Does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Helper to set the current user and their provider token in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
    id_token: &SecretString,
) -> Result<(), tower_sessions::session::Error> {
    // New id on privilege change.
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    session
        .insert(session_keys::ID_TOKEN, id_token.expose_secret())
        .await
}

/// The provider token stored at sign-in.
pub async fn admin_id_token(session: &Session) -> Option<SecretString> {
    session
        .get::<String>(session_keys::ID_TOKEN)
        .await
        .ok()
        .flatten()
        .filter(|token| !token.is_empty())
        .map(SecretString::from)
}

/// Helper to clear the current user from the session (logout).
///
/// Other session data, including the cart, is kept.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.remove_value(session_keys::ID_TOKEN).await?;
    Ok(())
}
