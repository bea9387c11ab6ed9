//! Premium subscription payments.

mod flutterwave;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use flutterwave::FlutterwaveGateway;

pub const DEFAULT_CUSTOMER_EMAIL: &str = "user@example.com";
pub const DEFAULT_CUSTOMER_NAME: &str = "User";

/// Who is paying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub email: String,
    pub name: String,
}

impl Default for Customer {
    fn default() -> Self {
        Self {
            email: DEFAULT_CUSTOMER_EMAIL.to_string(),
            name: DEFAULT_CUSTOMER_NAME.to_string(),
        }
    }
}

/// A hosted checkout page for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLink {
    pub tx_ref: String,
    pub link: String,
}

/// Gateway failures callers may want to tell apart.
#[derive(Debug, PartialEq)]
pub enum PaymentError {
    /// HTTP 401 from the gateway
    AuthenticationFailed,
    /// Gateway answered but did not create the payment
    Declined(String),
    /// Unexpected HTTP status
    Status(u16),
}

impl fmt::Display for PaymentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentError::AuthenticationFailed => write!(
                f,
                "Payment authentication failed. Check your FLUTTERWAVE_SECRET_KEY."
            ),
            PaymentError::Declined(msg) => write!(f, "Failed to create payment link: {}", msg),
            PaymentError::Status(code) => write!(f, "Payment service returned HTTP {}", code),
        }
    }
}

impl std::error::Error for PaymentError {}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a checkout link for the subscription.
    async fn create_payment_link(&self, customer: &Customer) -> Result<PaymentLink>;
}

/// Confirmation shown when the gateway redirects back after checkout.
pub fn subscription_success_message(tx_ref: &str) -> String {
    format!("Subscription successful! Transaction: {}", tx_ref)
}
