//! Stripe Checkout client.
//!
//! Opens hosted checkout sessions and reads back their payment status.
//! Stripe's API takes form-encoded bodies with bracketed keys
//! (`line_items[0][price_data][currency]`), so the request is flattened into
//! key/value pairs by [`checkout_form`].

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use crate::config::StripeConfig;
use crate::services::{
    CheckoutRequest, CheckoutSession, PaymentError, PaymentGateway, PaymentStatus,
};

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Placeholder Stripe substitutes with the session id in `success_url`.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Stripe API client.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
    payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeGateway {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the secret key is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| PaymentError::Parse(format!("Invalid secret key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    async fn read_session(response: reqwest::Response) -> Result<SessionResponse, PaymentError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(text);
            tracing::error!(status = %status, message = %message, "Stripe returned non-success status");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| PaymentError::Parse(e.to_string()))
    }
}

/// Flatten a checkout request into Stripe's form encoding.
///
/// Amounts are sent in the currency's minor unit. Only absolute http(s)
/// image URLs are forwarded.
///
/// # Errors
///
/// Returns `PaymentError::EmptyCart` with no lines, or
/// `PaymentError::InvalidAmount` if a price does not fit in minor units.
pub fn checkout_form(request: &CheckoutRequest) -> Result<Vec<(String, String)>, PaymentError> {
    if request.lines.is_empty() {
        return Err(PaymentError::EmptyCart);
    }

    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    let currency = request.currency.stripe_code();
    for (i, line) in request.lines.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        let unit_amount = line
            .unit_price
            .to_minor_units()
            .ok_or_else(|| PaymentError::InvalidAmount(line.name.clone()))?;

        form.push((
            format!("{prefix}[price_data][currency]"),
            currency.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            unit_amount.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            line.name.clone(),
        ));
        if let Some(image) = line
            .image
            .as_deref()
            .filter(|url| url.starts_with("https://") || url.starts_with("http://"))
        {
            form.push((
                format!("{prefix}[price_data][product_data][images][0]"),
                image.to_string(),
            ));
        }
        form.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
    }

    Ok(form)
}

/// Map Stripe's `payment_status`.
fn parse_payment_status(raw: &str) -> Result<PaymentStatus, PaymentError> {
    match raw {
        "paid" => Ok(PaymentStatus::Paid),
        "unpaid" => Ok(PaymentStatus::Unpaid),
        "no_payment_required" => Ok(PaymentStatus::NoPaymentRequired),
        other => Err(PaymentError::Parse(format!("unknown payment_status: {other}"))),
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let form = checkout_form(request)?;

        let response = self
            .client
            .post(format!("{BASE_URL}/checkout/sessions"))
            .form(&form)
            .send()
            .await?;

        let session = Self::read_session(response).await?;
        let url = session
            .url
            .ok_or_else(|| PaymentError::Parse("checkout session has no url".to_string()))?;

        tracing::info!(session_id = %session.id, "Created checkout session");
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    #[instrument(skip(self))]
    async fn session_status(&self, session_id: &str) -> Result<PaymentStatus, PaymentError> {
        let url = format!(
            "{BASE_URL}/checkout/sessions/{}",
            urlencoding::encode(session_id)
        );
        let response = self.client.get(&url).send().await?;
        let session = Self::read_session(response).await?;

        session
            .payment_status
            .as_deref()
            .map_or(Ok(PaymentStatus::Unpaid), parse_payment_status)
    }
}
