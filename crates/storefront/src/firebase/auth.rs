//! Firebase Identity Toolkit client (email/password sign-in).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::{API_KEY_HEADER, truncate_body};
use crate::config::FirebaseConfig;
use crate::services::{Identity, IdentityError, IdentityProvider};

const IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Email/password identity provider backed by Firebase Auth.
#[derive(Clone)]
pub struct FirebaseIdentity {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    custom_attributes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseIdentity {
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.expose_secret().to_string(),
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, IdentityError> {
        let url = format!("{IDENTITY_BASE_URL}/accounts:{method}");
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(map_error(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| IdentityError::Parse(e.to_string()))
    }
}

/// Map an Identity Toolkit error response.
fn map_error(status: u16, body: &str) -> IdentityError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_default();

    match message.as_str() {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS"
        | "USER_DISABLED" => IdentityError::InvalidCredentials,
        m if m.starts_with("TOO_MANY_ATTEMPTS") => IdentityError::TooManyAttempts,
        _ => {
            tracing::error!(
                status,
                body = %truncate_body(body, 500),
                "Identity Toolkit returned non-success status"
            );
            IdentityError::Api {
                status,
                message: truncate_body(body, 200),
            }
        }
    }
}

/// Extract role claims from an account's `customAttributes` JSON.
///
/// Accepts `{"role": "admin"}`, `{"roles": ["admin", ...]}` or both.
fn roles_from_custom_attributes(raw: Option<&str>) -> Vec<String> {
    let Some(value) = raw.and_then(|r| serde_json::from_str::<serde_json::Value>(r).ok()) else {
        return Vec::new();
    };

    let mut roles: Vec<String> = value
        .get("roles")
        .and_then(serde_json::Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if let Some(role) = value.get("role").and_then(serde_json::Value::as_str)
        && !roles.iter().any(|r| r == role)
    {
        roles.push(role.to_string());
    }

    roles
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let signed_in: SignInResponse = self
            .post(
                "signInWithPassword",
                &json!({
                    "email": email,
                    "password": password,
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let lookup: LookupResponse = self
            .post("lookup", &json!({ "idToken": signed_in.id_token }))
            .await?;

        let roles = roles_from_custom_attributes(
            lookup
                .users
                .first()
                .and_then(|u| u.custom_attributes.as_deref()),
        );

        tracing::info!(uid = %signed_in.local_id, "User signed in");

        Ok(Identity {
            uid: signed_in.local_id,
            email: signed_in.email.unwrap_or_else(|| email.to_string()),
            roles,
            id_token: SecretString::from(signed_in.id_token),
        })
    }
}
