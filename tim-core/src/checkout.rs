use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tim_catalog::ConfigurationState;
use tim_shared::pii::Masked;

use crate::{CoreError, CoreResult};

/// Postal address as collected by the checkout form
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: Masked<String>,
    pub last_name: Masked<String>,
    pub email: Masked<String>,
    pub address1: Masked<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<Masked<String>>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub zip_code: String,
    pub country: String,
}

impl Address {
    /// Every mandatory field must be non-blank. `label` names the address in
    /// the error ("shipping", "billing").
    pub fn validate(&self, label: &str) -> CoreResult<()> {
        let required = [
            ("firstName", self.first_name.is_blank()),
            ("lastName", self.last_name.is_blank()),
            ("email", self.email.is_blank()),
            ("address1", self.address1.is_blank()),
            ("city", self.city.trim().is_empty()),
            ("zipCode", self.zip_code.trim().is_empty()),
            ("country", self.country.trim().is_empty()),
        ];

        if let Some((field, _)) = required.iter().find(|(_, blank)| *blank) {
            return Err(CoreError::ValidationError(format!(
                "{} address is missing {}",
                label, field
            )));
        }

        if !self.email.expose().contains('@') {
            return Err(CoreError::ValidationError(format!(
                "{} address has an invalid email",
                label
            )));
        }

        Ok(())
    }
}

/// Body of the hosted `create-checkout` function
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub configuration: ConfigurationState,
    pub shipping_address: Address,
    pub billing_address: Address,
}

impl CheckoutRequest {
    /// Amount charged, in euro cents
    pub fn amount_cents(&self) -> u64 {
        self.configuration.total_price as u64 * 100
    }
}

/// Where to send the customer to pay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutSession {
    pub url: String,
    pub order_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
}

/// Result of the hosted `verify-payment` function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentVerification {
    pub order_id: String,
    pub status: OrderStatus,
    /// Euro cents
    pub total_amount: u64,
    pub currency: String,
}

/// The hosted checkout backend. Payment itself happens on the provider's page.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Create the order record and a payment session
    async fn create_checkout(&self, request: &CheckoutRequest) -> CoreResult<CheckoutSession>;

    /// Look up the order behind a payment session
    async fn verify_payment(&self, session_id: &str) -> CoreResult<PaymentVerification>;
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_valid_address() {
        assert!(address().validate("shipping").is_ok());
    }

    #[test]
    fn test_missing_field_reported() {
        let mut addr = address();
        addr.city = "  ".to_string();
        let err = addr.validate("billing").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: billing address is missing city");
    }

    #[test]
    fn test_invalid_email() {
        let mut addr = address();
        addr.email = Masked::new("jane.example.com".to_string());
        assert!(addr.validate("shipping").is_err());
    }

    #[test]
    fn test_address_wire_format() {
        let json = serde_json::to_value(address()).unwrap();
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["zipCode"], "1015 CJ");
        assert!(json.get("address2").is_none());
    }

    #[test]
    fn test_order_status_lowercase() {
        assert_eq!(serde_json::to_string(&OrderStatus::Paid).unwrap(), "\"paid\"");
    }
}
