use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tim_catalog::ConfigurationState;
use tim_core::checkout::OrderStatus;

/// A checkout handed to the hosted backend, tracked locally until paid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub checkout_url: String,
    pub configuration: ConfigurationState,
    pub amount_cents: u64,
    pub currency: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(id: String, checkout_url: String, configuration: ConfigurationState) -> Self {
        let now = Utc::now();
        Self {
            id,
            checkout_url,
            amount_cents: configuration.total_price as u64 * 100,
            configuration,
            currency: "EUR".to_string(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_status(&mut self, new_status: OrderStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    /// Paid and cancelled orders never change again
    pub fn is_final(&self) -> bool {
        matches!(self.status, OrderStatus::Paid | OrderStatus::Cancelled)
    }
}
