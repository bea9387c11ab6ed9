//! Flutterwave v3 hosted-payment gateway.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::StatusCode;
use uuid::Uuid;

use super::{Customer, PaymentError, PaymentGateway, PaymentLink};
use crate::config::PaymentConfig;
use crate::http::HttpClient;

const PAYMENT_OPTIONS: &str = "card,mobilemoney";
const CHECKOUT_TITLE: &str = "Mood Journal Premium Subscription";
const CHECKOUT_DESCRIPTION: &str = "Monthly access to premium mood analytics and insights";

/// Flutterwave API payload and response types (internal).
mod api {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Debug)]
    pub struct PaymentRequest<'a> {
        pub tx_ref: &'a str,
        pub amount: String,
        pub currency: &'a str,
        pub redirect_url: String,
        pub payment_options: &'a str,
        pub customer: Customer<'a>,
        pub customizations: Customizations<'a>,
    }

    #[derive(Serialize, Debug)]
    pub struct Customer<'a> {
        pub email: &'a str,
        pub name: &'a str,
    }

    #[derive(Serialize, Debug)]
    pub struct Customizations<'a> {
        pub title: &'a str,
        pub description: &'a str,
    }

    #[derive(Deserialize, Debug)]
    pub struct PaymentResponse {
        pub status: String,
        #[serde(default)]
        pub message: Option<String>,
        #[serde(default)]
        pub data: Option<PaymentData>,
    }

    #[derive(Deserialize, Debug)]
    pub struct PaymentData {
        pub link: String,
    }
}

/// Creates hosted checkout links through Flutterwave.
pub struct FlutterwaveGateway {
    http_client: HttpClient,
    config: PaymentConfig,
}

impl FlutterwaveGateway {
    pub fn new(config: PaymentConfig) -> Result<Self> {
        let http_client = HttpClient::with_timeout(config.timeout)?;
        Ok(Self::from_http_client(http_client, config))
    }

    pub fn from_http_client(http_client: HttpClient, config: PaymentConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn redirect_url(&self, tx_ref: &str) -> String {
        let separator = if self.config.redirect_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!("{}{}tx_ref={}", self.config.redirect_url, separator, tx_ref)
    }

    async fn create_with_ref(&self, customer: &Customer, tx_ref: &str) -> Result<PaymentLink> {
        let url = format!("{}/payments", self.config.api_url);
        let payload = api::PaymentRequest {
            tx_ref,
            amount: self.config.amount.to_string(),
            currency: &self.config.currency,
            redirect_url: self.redirect_url(tx_ref),
            payment_options: PAYMENT_OPTIONS,
            customer: api::Customer {
                email: &customer.email,
                name: &customer.name,
            },
            customizations: api::Customizations {
                title: CHECKOUT_TITLE,
                description: CHECKOUT_DESCRIPTION,
            },
        };

        info!("Attempting payment with tx_ref: {}", tx_ref);
        let response = self
            .http_client
            .post_json(&url, &self.config.secret_key, &payload)
            .await
            .context("Subscription service unavailable")?;

        let status = response.status();
        debug!("Flutterwave response status: {}", status);

        if status == StatusCode::UNAUTHORIZED {
            error!("Flutterwave authentication failed - check your secret key");
            return Err(PaymentError::AuthenticationFailed.into());
        }
        if !status.is_success() {
            return Err(PaymentError::Status(status.as_u16()).into());
        }

        let body: api::PaymentResponse = response
            .json()
            .await
            .context("Failed to parse payment gateway response")?;

        match body {
            api::PaymentResponse {
                ref status,
                data: Some(data),
                ..
            } if status == "success" => Ok(PaymentLink {
                tx_ref: tx_ref.to_string(),
                link: data.link,
            }),
            other => {
                error!("Flutterwave error: {:?}", other);
                let reason = other.message.unwrap_or(other.status);
                Err(PaymentError::Declined(reason).into())
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for FlutterwaveGateway {
    async fn create_payment_link(&self, customer: &Customer) -> Result<PaymentLink> {
        let tx_ref = Uuid::new_v4().to_string();
        self.create_with_ref(customer, &tx_ref).await
    }
}
