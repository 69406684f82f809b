pub mod product;
pub mod catalog;
pub mod configuration;
pub mod pricing;
pub mod savings;

pub use product::{ProductConfig, ProductUpgrade, SoftwareAddon, UpgradeCategory};
pub use catalog::{Catalog, CatalogError};
pub use configuration::ConfigurationState;
pub use pricing::{LineKind, PriceBreakdown, PriceLine, PricingEngine};
pub use savings::{CloudPricingCalculator, LifetimeSavings, ModelRecommendation, SavingsCalculation, TimModel};
