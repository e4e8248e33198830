//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::{CatalogError, IdentityError, ImageError, PaymentError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog lookup failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Payment gateway operation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Image upload failed.
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Sign-in failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Catalog(err) => match err {
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Denied { .. } => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Image(err) => match err {
                ImageError::Invalid(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Identity(err) => match err {
                IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                IdentityError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Catalog(CatalogError::NotFound(_)) => "Not found".to_string(),
            Self::Catalog(CatalogError::Denied { .. }) => {
                "Your admin session has expired, please sign in again".to_string()
            }
            Self::Catalog(_) | Self::Payment(_) => "External service error".to_string(),
            Self::Image(ImageError::Invalid(msg)) => msg.clone(),
            Self::Image(_) => "Image upload failed".to_string(),
            Self::Identity(IdentityError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Identity(IdentityError::TooManyAttempts) => {
                "Too many attempts, please try again later".to_string()
            }
            Self::Identity(_) => "Authentication error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        (status, self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful sign-in to associate errors with users.
pub fn set_sentry_user(uid: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(uid.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "vase-01")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::EmptyCart)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Identity(IdentityError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Image(ImageError::Invalid("x".to_string()))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::Internal("db password leaked".to_string());
        assert_eq!(err.public_message(), "Internal server error");

        let err = AppError::Catalog(CatalogError::Api {
            status: 500,
            message: "stack trace".to_string(),
        });
        assert_eq!(err.public_message(), "External service error");
    }

    #[test]
    fn test_catalog_write_errors() {
        let denied = AppError::Catalog(CatalogError::Denied { status: 403 });
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
        assert!(denied.public_message().contains("sign in again"));

        let missing = AppError::Catalog(CatalogError::NotFound("products/x".to_string()));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.public_message(), "Not found");
    }
}
