use crate::models::Order;
use std::collections::HashMap;
use tim_core::checkout::OrderStatus;

/// Orders started in this process, keyed by backend order id
pub struct OrderLedger {
    orders: HashMap<String, Order>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
        }
    }

    pub fn record(&mut self, order: Order) {
        self.orders.insert(order.id.clone(), order);
    }

    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Apply a status reported by the payment backend.
    ///
    /// Pending → Paid | Failed | Cancelled, Failed → Paid (retried payment).
    /// Paid and Cancelled are final.
    pub fn apply_status(&mut self, order_id: &str, status: OrderStatus) -> Result<&Order, OrderError> {
        let order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        if order.status == status {
            return Ok(order);
        }

        let allowed = match order.status {
            OrderStatus::Pending => status != OrderStatus::Pending,
            OrderStatus::Failed => matches!(status, OrderStatus::Paid | OrderStatus::Cancelled),
            OrderStatus::Paid | OrderStatus::Cancelled => false,
        };

        if !allowed {
            return Err(OrderError::InvalidTransition {
                from: format!("{:?}", order.status),
                to: format!("{:?}", status),
            });
        }

        order.update_status(status);
        Ok(order)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl Default for OrderLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tim_catalog::{Catalog, ConfigurationState};

    fn order(id: &str) -> Order {
        let catalog = Catalog::standard();
        let configuration = ConfigurationState::new(catalog.product("tim-pro").unwrap().clone());
        Order::new(id.to_string(), "https://pay.example/cs_1".to_string(), configuration)
    }

    #[test]
    fn test_order_amount_in_cents() {
        let order = order("ord_1");
        assert_eq!(order.amount_cents, 69_900);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_status_lifecycle() {
        let mut ledger = OrderLedger::new();
        ledger.record(order("ord_1"));

        ledger.apply_status("ord_1", OrderStatus::Failed).unwrap();
        ledger.apply_status("ord_1", OrderStatus::Paid).unwrap();
        assert!(ledger.get("ord_1").unwrap().is_final());

        // Paid is final
        assert!(ledger.apply_status("ord_1", OrderStatus::Pending).is_err());
        // Re-reporting the same status is fine
        assert!(ledger.apply_status("ord_1", OrderStatus::Paid).is_ok());
    }

    #[test]
    fn test_unknown_order() {
        let mut ledger = OrderLedger::new();
        assert!(matches!(
            ledger.apply_status("nope", OrderStatus::Paid),
            Err(OrderError::NotFound(_))
        ));
    }
}
