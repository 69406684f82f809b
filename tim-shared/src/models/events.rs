use uuid::Uuid;

/// Emitted after a session's configuration total was recomputed
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ConfigurationPricedEvent {
    pub session_id: Uuid,
    pub product_id: Option<String>,
    pub total_price: u32,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CheckoutStartedEvent {
    pub session_id: Uuid,
    pub order_id: String,
    pub amount_cents: u64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct InternetStatusChangedEvent {
    pub allow_internet: bool,
    pub is_connected: bool,
    pub timestamp: i64,
}
