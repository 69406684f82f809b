use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tim_core::checkout::{CheckoutGateway, CheckoutRequest, CheckoutSession, OrderStatus, PaymentVerification};
use tim_core::{CoreError, CoreResult};
use tracing::{error, info};

/// Client for the hosted `create-checkout` / `verify-payment` functions
#[derive(Debug, Clone)]
pub struct FunctionsCheckoutGateway {
    http_client: reqwest::Client,
    base_url: String,
    anon_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct VerifyBody {
    order: OrderBody,
}

#[derive(Debug, Deserialize)]
struct OrderBody {
    id: String,
    status: OrderStatus,
    total_amount: u64,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    "EUR".to_string()
}

impl FunctionsCheckoutGateway {
    pub fn new(base_url: &str, anon_key: Option<String>, timeout: Duration) -> CoreResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::GatewayError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    async fn invoke<B, R>(&self, function: &str, body: &B) -> CoreResult<R>
    where
        B: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, function);
        let mut request = self.http_client.post(&url).json(body);
        if let Some(key) = &self.anon_key {
            request = request.bearer_auth(key).header("apikey", key);
        }

        let response = request.send().await.map_err(|e| {
            error!("Call to {} failed: {}", function, e);
            CoreError::GatewayError(format!("{}: {}", function, e))
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::GatewayError(format!("{}: {}", function, e)))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            error!("{} returned {}: {}", function, status, message);
            return Err(CoreError::GatewayError(format!("{}: {}", function, message)));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::GatewayError(format!("{}: malformed response: {}", function, e)))
    }
}

#[async_trait]
impl CheckoutGateway for FunctionsCheckoutGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> CoreResult<CheckoutSession> {
        let session: CheckoutSession = self.invoke("create-checkout", request).await?;
        info!("Checkout session created for order {}", session.order_id);
        Ok(session)
    }

    async fn verify_payment(&self, session_id: &str) -> CoreResult<PaymentVerification> {
        let body = serde_json::json!({ "session_id": session_id });
        let verified: VerifyBody = self.invoke("verify-payment", &body).await?;
        Ok(PaymentVerification {
            order_id: verified.order.id,
            status: verified.order.status,
            total_amount: verified.order.total_amount,
            currency: verified.order.currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tim_catalog::{Catalog, ConfigurationState};
    use tim_core::checkout::Address;
    use tim_shared::Masked;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn address() -> Address {
        Address {
            first_name: Masked::new("Jane".to_string()),
            last_name: Masked::new("Doe".to_string()),
            email: Masked::new("jane@example.com".to_string()),
            address1: Masked::new("Keizersgracht 1".to_string()),
            address2: None,
            city: "Amsterdam".to_string(),
            state: None,
            zip_code: "1015 CJ".to_string(),
            country: "NL".to_string(),
        }
    }

    fn request() -> CheckoutRequest {
        let catalog = Catalog::standard();
        CheckoutRequest {
            configuration: ConfigurationState::new(catalog.product("just-tim").unwrap().clone()),
            shipping_address: address(),
            billing_address: address(),
        }
    }

    fn gateway(server: &MockServer) -> FunctionsCheckoutGateway {
        FunctionsCheckoutGateway::new(&server.uri(), Some("anon".to_string()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_create_checkout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create-checkout"))
            .and(header("apikey", "anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://checkout.stripe.com/c/pay/cs_test_1",
                "order_id": "ord_1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = gateway(&server).create_checkout(&request()).await.unwrap();
        assert_eq!(session.order_id, "ord_1");
        assert!(session.url.starts_with("https://checkout.stripe.com"));
    }

    #[tokio::test]
    async fn test_error_body_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create-checkout"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "Configuration is required"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server).create_checkout(&request()).await.unwrap_err();
        assert!(err.to_string().contains("Configuration is required"));
    }

    #[tokio::test]
    async fn test_verify_payment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/verify-payment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "order": { "id": "ord_1", "status": "paid", "total_amount": 44900 }
            })))
            .mount(&server)
            .await;

        let verification = gateway(&server).verify_payment("cs_test_1").await.unwrap();
        assert_eq!(verification.status, OrderStatus::Paid);
        assert_eq!(verification.total_amount, 44900);
        assert_eq!(verification.currency, "EUR");
    }
}
