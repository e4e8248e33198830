//! Payment gateway contract.

use async_trait::async_trait;
use shesha_core::{Cart, CurrencyCode, Price};
use thiserror::Error;

/// Errors from the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A price cannot be charged in the currency's minor unit.
    #[error("Invalid amount for {0}")]
    InvalidAmount(String),

    /// Nothing to pay for.
    #[error("Cart is empty")]
    EmptyCart,
}

/// One line to charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub image: Option<String>,
}

/// Everything the gateway needs to open a hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub lines: Vec<CheckoutLine>,
    pub currency: CurrencyCode,
    /// Where the gateway sends the buyer after paying. May contain the
    /// gateway's session id placeholder.
    pub success_url: String,
    /// Where the gateway sends the buyer on cancel.
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// Build a request from the cart's current lines.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::EmptyCart` if the cart has no lines.
    pub fn from_cart(
        cart: &Cart,
        currency: CurrencyCode,
        success_url: String,
        cancel_url: String,
    ) -> Result<Self, PaymentError> {
        if cart.is_empty() {
            return Err(PaymentError::EmptyCart);
        }

        let lines = cart
            .items()
            .iter()
            .map(|item| CheckoutLine {
                name: item.name.clone(),
                unit_price: item.price,
                quantity: item.quantity.get(),
                image: Some(item.image.clone()).filter(|url| !url.is_empty()),
            })
            .collect();

        Ok(Self {
            lines,
            currency,
            success_url,
            cancel_url,
        })
    }
}

/// A hosted checkout the buyer is redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Payment state of a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl PaymentStatus {
    /// Whether the order can be considered complete.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Paid | Self::NoPaymentRequired)
    }
}

/// Hosted checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a checkout session for `request`.
    async fn create_session(&self, request: &CheckoutRequest)
    -> Result<CheckoutSession, PaymentError>;

    /// Look up the payment state of a session created earlier.
    async fn session_status(&self, session_id: &str) -> Result<PaymentStatus, PaymentError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use shesha_core::{NewLineItem, ProductId};

    use super::*;

    #[test]
    fn test_request_from_empty_cart_is_rejected() {
        let result = CheckoutRequest::from_cart(
            &Cart::new(),
            CurrencyCode::USD,
            "s".to_string(),
            "c".to_string(),
        );
        assert!(matches!(result, Err(PaymentError::EmptyCart)));
    }

    #[test]
    fn test_request_from_cart_copies_lines() {
        let mut cart = Cart::new();
        let id = cart.add_item(NewLineItem {
            product_id: ProductId::new("p1"),
            name: "Vase".to_string(),
            price: Price::from_units(25),
            image: String::new(),
        });
        cart.update_quantity(&id, 3);

        let request =
            CheckoutRequest::from_cart(&cart, CurrencyCode::EUR, "s".into(), "c".into()).unwrap();
        assert_eq!(request.lines.len(), 1);
        assert_eq!(request.lines[0].quantity, 3);
        assert_eq!(request.lines[0].unit_price, Price::from_units(25));
        assert_eq!(request.lines[0].image, None);
        assert_eq!(request.currency, CurrencyCode::EUR);
    }

    #[test]
    fn test_settled_statuses() {
        assert!(PaymentStatus::Paid.is_settled());
        assert!(PaymentStatus::NoPaymentRequired.is_settled());
        assert!(!PaymentStatus::Unpaid.is_settled());
    }
}
