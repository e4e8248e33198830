//! Authentication route handlers.
//!
//! Email/password sign-in against the identity provider. Signing out only
//! forgets the user; the rest of the session (including the cart) stays.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::IdentityError;
use crate::state::AppState;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub email: String,
}

/// Display login page.
///
/// Signed-in users go straight home.
pub async fn login_page(OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let identity = match state.identity().sign_in(&form.email, &form.password).await {
        Ok(identity) => identity,
        Err(e @ (IdentityError::InvalidCredentials | IdentityError::TooManyAttempts)) => {
            let status = AppError::Identity(e).status();
            let message = if status == StatusCode::TOO_MANY_REQUESTS {
                "Too many attempts. Please try again later."
            } else {
                "Invalid email or password."
            };
            tracing::info!(status = %status, "Sign-in rejected");
            return Ok((
                status,
                LoginTemplate {
                    error: Some(message.to_string()),
                    email: form.email,
                },
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let id_token = identity.id_token.clone();
    let user = CurrentUser::from(identity);
    set_current_user(&session, &user, &id_token).await?;
    set_sentry_user(&user.uid, Some(&user.email));

    let destination = if user.has_role(&state.config().admin_role) {
        "/admin"
    } else {
        "/"
    };
    Ok(Redirect::to(destination).into_response())
}

/// Handle logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
