use anyhow::Result;

use crate::{
    config::PaymentConfig,
    payment::{
        Customer, FlutterwaveGateway, PaymentGateway, PaymentLink, subscription_success_message,
    },
    runtime::Runtime,
};

/// Create a checkout link for the premium subscription
#[tracing::instrument(skip(runtime, customer))]
pub async fn subscribe<R: Runtime>(runtime: R, customer: Customer, json: bool) -> Result<()> {
    let config = PaymentConfig::from_runtime(&runtime)?;
    let gateway = FlutterwaveGateway::new(config)?;

    let link = request_subscription(&gateway, customer).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&link)?);
    } else {
        println!("Complete your subscription at: {}", link.link);
        println!("Transaction reference: {}", link.tx_ref);
    }
    Ok(())
}

/// Blank customer fields fall back to the defaults.
pub async fn request_subscription<G: PaymentGateway + ?Sized>(
    gateway: &G,
    customer: Customer,
) -> Result<PaymentLink> {
    let defaults = Customer::default();
    let customer = Customer {
        email: non_blank(customer.email).unwrap_or(defaults.email),
        name: non_blank(customer.name).unwrap_or(defaults.name),
    };
    gateway.create_payment_link(&customer).await
}

/// Print the confirmation for a completed checkout
pub fn subscription_success(tx_ref: &str) -> Result<()> {
    println!("{}", subscription_success_message(tx_ref));
    Ok(())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{MockPaymentGateway, PaymentError};
    use crate::runtime::MockRuntime;

    #[tokio::test]
    async fn test_request_subscription_passes_customer() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_payment_link()
            .withf(|c: &Customer| c.email == "kev@example.com" && c.name == "Kevin")
            .times(1)
            .returning(|_| {
                Ok(PaymentLink {
                    tx_ref: "ref".into(),
                    link: "https://checkout.example/ref".into(),
                })
            });

        let link = request_subscription(
            &gateway,
            Customer {
                email: " kev@example.com ".into(),
                name: "Kevin".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(link.link, "https://checkout.example/ref");
    }

    #[tokio::test]
    async fn test_request_subscription_fills_blank_fields() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_payment_link()
            .withf(|c: &Customer| *c == Customer::default())
            .returning(|_| {
                Ok(PaymentLink {
                    tx_ref: "ref".into(),
                    link: "https://checkout.example/ref".into(),
                })
            });

        let customer = Customer {
            email: "".into(),
            name: "  ".into(),
        };
        assert!(request_subscription(&gateway, customer).await.is_ok());
    }

    #[tokio::test]
    async fn test_request_subscription_propagates_gateway_errors() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_payment_link()
            .returning(|_| Err(PaymentError::AuthenticationFailed.into()));

        let err = request_subscription(&gateway, Customer::default())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<PaymentError>().is_some());
    }

    #[tokio::test]
    async fn test_subscribe_requires_secret_key() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));

        let err = subscribe(runtime, Customer::default(), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("FLUTTERWAVE_SECRET_KEY"));
    }

    #[test]
    fn test_subscription_success() {
        assert!(subscription_success("abc").is_ok());
    }
}
