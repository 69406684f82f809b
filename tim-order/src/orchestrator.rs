use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tim_catalog::{ConfigurationState, PricingEngine};
use tim_core::checkout::{Address, CheckoutGateway, CheckoutRequest, CheckoutSession, OrderStatus, PaymentVerification};
use tim_core::{CoreError, CoreResult};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::Order;

/// Hands a priced configuration to the checkout backend
pub struct CheckoutOrchestrator {
    gateway: Arc<dyn CheckoutGateway>,
    pricing: PricingEngine,
}

impl CheckoutOrchestrator {
    pub fn new(gateway: Arc<dyn CheckoutGateway>, pricing: PricingEngine) -> Self {
        Self { gateway, pricing }
    }

    /// Create a payment session for `configuration`.
    ///
    /// The total is recomputed before anything leaves the process, so the
    /// backend never charges a stale figure.
    pub async fn start_checkout(
        &self,
        configuration: Option<&ConfigurationState>,
        shipping_address: Address,
        billing_address: Address,
    ) -> Result<Order, CheckoutError> {
        let configuration = configuration.ok_or(CheckoutError::NoConfiguration)?;

        shipping_address
            .validate("shipping")
            .map_err(|e| CheckoutError::InvalidAddress(e.to_string()))?;
        billing_address
            .validate("billing")
            .map_err(|e| CheckoutError::InvalidAddress(e.to_string()))?;

        let mut configuration = configuration.clone();
        let total = self.pricing.calculate_total(&configuration);
        if total != configuration.total_price {
            warn!(
                "Checkout total for {} corrected from {} to {}",
                configuration.product_id(),
                configuration.total_price,
                total
            );
            configuration.total_price = total;
        }

        let request = CheckoutRequest {
            configuration,
            shipping_address,
            billing_address,
        };

        info!(
            "Starting checkout for {} ({} cents) to {}",
            request.configuration.product_id(),
            request.amount_cents(),
            request.shipping_address.email.hint()
        );

        let session = self.gateway.create_checkout(&request).await?;
        Ok(Order::new(session.order_id, session.url, request.configuration))
    }

    pub async fn verify_payment(&self, session_id: &str) -> Result<PaymentVerification, CheckoutError> {
        Ok(self.gateway.verify_payment(session_id).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Please configure your TIM before proceeding to checkout")]
    NoConfiguration,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Gateway(#[from] CoreError),
}

/// Offline stand-in for the hosted checkout: every session is paid
/// immediately and nothing leaves the process.
#[derive(Default)]
pub struct MockCheckoutGateway {
    sessions: Mutex<HashMap<String, u64>>,
}

impl MockCheckoutGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CheckoutGateway for MockCheckoutGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> CoreResult<CheckoutSession> {
        let order_id = format!("mock_{}", Uuid::new_v4().simple());
        let amount = request.amount_cents();

        self.sessions
            .lock()
            .map_err(|_| CoreError::GatewayError("mock session lock poisoned".to_string()))?
            .insert(order_id.clone(), amount);

        Ok(CheckoutSession {
            url: format!(
                "/website/success?mock_order_id={}&total={}",
                order_id, request.configuration.total_price
            ),
            order_id,
        })
    }

    async fn verify_payment(&self, session_id: &str) -> CoreResult<PaymentVerification> {
        let amount = self
            .sessions
            .lock()
            .map_err(|_| CoreError::GatewayError("mock session lock poisoned".to_string()))?
            .get(session_id)
            .copied()
            .ok_or_else(|| CoreError::GatewayError(format!("Unknown checkout session: {}", session_id)))?;

        Ok(PaymentVerification {
            order_id: session_id.to_string(),
            status: OrderStatus::Paid,
            total_amount: amount,
            currency: "EUR".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tim_catalog::{Catalog, UpgradeCategory};
    use tim_shared::Masked;

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

    fn orchestrator() -> (CheckoutOrchestrator, Arc<Catalog>) {
        let catalog = Arc::new(Catalog::standard());
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(MockCheckoutGateway::new()),
            PricingEngine::new(catalog.clone()),
        );
        (orchestrator, catalog)
    }

    #[tokio::test]
    async fn test_checkout_requires_configuration() {
        let (orchestrator, _) = orchestrator();
        let result = orchestrator.start_checkout(None, address(), address()).await;
        assert!(matches!(result, Err(CheckoutError::NoConfiguration)));
    }

    #[tokio::test]
    async fn test_checkout_rejects_incomplete_address() {
        let (orchestrator, catalog) = orchestrator();
        let state = ConfigurationState::new(catalog.product("tim-max").unwrap().clone());
        let mut billing = address();
        billing.zip_code = String::new();

        let result = orchestrator.start_checkout(Some(&state), address(), billing).await;
        assert!(matches!(result, Err(CheckoutError::InvalidAddress(msg)) if msg.contains("zipCode")));
    }

    #[tokio::test]
    async fn test_checkout_reprices_and_verifies() {
        let (orchestrator, catalog) = orchestrator();
        let product = catalog.product("tim-max").unwrap().clone();
        let gpu = product.find_upgrade(UpgradeCategory::Gpu, "rtx-3060").cloned();
        let mut state = ConfigurationState::new(product);
        state.set_upgrade(UpgradeCategory::Gpu, gpu);
        state.total_price = 10;

        let order = orchestrator.start_checkout(Some(&state), address(), address()).await.unwrap();
        assert!(order.id.starts_with("mock_"));
        assert_eq!(order.configuration.total_price, 1599);
        assert_eq!(order.amount_cents, 159_900);
        assert!(order.checkout_url.contains("total=1599"));

        let verification = orchestrator.verify_payment(&order.id).await.unwrap();
        assert_eq!(verification.status, OrderStatus::Paid);
        assert_eq!(verification.total_amount, 159_900);
    }

    #[tokio::test]
    async fn test_verify_unknown_session() {
        let (orchestrator, _) = orchestrator();
        assert!(matches!(
            orchestrator.verify_payment("cs_missing").await,
            Err(CheckoutError::Gateway(_))
        ));
    }
}
