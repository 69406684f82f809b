pub mod models;
pub mod manager;
pub mod orchestrator;
pub mod internet;

pub use models::Order;
pub use manager::OrderLedger;
pub use orchestrator::{CheckoutError, CheckoutOrchestrator, MockCheckoutGateway};
pub use internet::InternetControl;
