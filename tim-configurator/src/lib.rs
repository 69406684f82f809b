pub mod models;
pub mod engine;
pub mod suggestion;

pub use models::ConfigurationUpdate;
pub use engine::{ConfigurationError, ConfigurationPricingEngine};
pub use suggestion::{suggest_upgrade, UpgradeSuggestion};
