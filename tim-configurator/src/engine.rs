use std::collections::BTreeSet;
use std::sync::Arc;

use tim_catalog::{Catalog, ConfigurationState, PriceBreakdown, PricingEngine, ProductConfig, UpgradeCategory};
use tim_core::storage::KeyValueStore;
use tracing::{debug, error, info, warn};

use crate::models::ConfigurationUpdate;

/// Owns one customer's configuration and keeps its total in step with every
/// edit. Each edit is written through to the key-value store; the store is
/// read once, on [`restore`](Self::restore).
///
/// States: no product selected → product selected (with any upgrades).
pub struct ConfigurationPricingEngine {
    pricing: PricingEngine,
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    configuration: Option<ConfigurationState>,
}

impl ConfigurationPricingEngine {
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        Self {
            pricing: PricingEngine::new(catalog),
            store,
            storage_key: storage_key.into(),
            configuration: None,
        }
    }

    /// Construct and immediately load whatever was persisted under `storage_key`
    pub fn open(catalog: Arc<Catalog>, store: Arc<dyn KeyValueStore>, storage_key: impl Into<String>) -> Self {
        let mut engine = Self::new(catalog, store, storage_key);
        engine.restore();
        engine
    }

    pub fn catalog(&self) -> &Catalog {
        self.pricing.catalog()
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn configuration(&self) -> Option<&ConfigurationState> {
        self.configuration.as_ref()
    }

    /// Start over with `product_id` at its base price
    pub fn select_product(&mut self, product_id: &str) -> Result<&ConfigurationState, ConfigurationError> {
        let product = self.lookup_product(product_id)?;
        let mut state = ConfigurationState::new(product);
        state.total_price = self.pricing.calculate_total(&state);

        info!("Selected product {} at {}", product_id, state.total_price);
        Ok(self.commit(state))
    }

    /// Move to another base unit, carrying over add-ons the new unit supports.
    /// Hardware upgrades and the jailbreak flag belong to the old unit and are dropped.
    pub fn switch_product(&mut self, product_id: &str) -> Result<&ConfigurationState, ConfigurationError> {
        let previous_software = self
            .configuration
            .as_ref()
            .map(|c| c.selected_software.clone())
            .unwrap_or_default();

        let product = self.lookup_product(product_id)?;
        let mut state = ConfigurationState::new(product);
        state.selected_software = self.compatible_software(&state.selected_product, &previous_software);
        state.total_price = self.pricing.calculate_total(&state);

        info!(
            "Switched to product {} keeping {} add-on(s), total {}",
            product_id,
            state.selected_software.len(),
            state.total_price
        );
        Ok(self.commit(state))
    }

    /// Merge `update` into the current configuration and reprice it.
    ///
    /// The update is applied all-or-nothing: an upgrade id the product does
    /// not offer rejects the whole update. Add-on ids the product cannot take
    /// are dropped, and the jailbreak flag is forced off on products that
    /// disallow it.
    pub fn update_configuration(&mut self, update: ConfigurationUpdate) -> Result<&ConfigurationState, ConfigurationError> {
        let current = self
            .configuration
            .as_ref()
            .ok_or(ConfigurationError::NoProductSelected)?;

        let mut next = current.clone();

        for (category, selection) in &update.upgrades {
            let upgrade = match selection {
                None => None,
                Some(upgrade_id) => {
                    let found = next.selected_product.find_upgrade(*category, upgrade_id).cloned();
                    if found.is_none() {
                        warn!(
                            "Rejected {} upgrade {} for product {}",
                            category,
                            upgrade_id,
                            next.product_id()
                        );
                        return Err(ConfigurationError::InvalidUpgrade {
                            product_id: next.product_id().to_string(),
                            category: *category,
                            upgrade_id: upgrade_id.clone(),
                        });
                    }
                    found
                }
            };
            next.set_upgrade(*category, upgrade);
        }

        if let Some(include) = update.include_jailbreak {
            if include && !next.selected_product.allows_jailbreak {
                warn!("Jailbreak not available for product {}", next.product_id());
            }
            next.include_jailbreak = next.selected_product.normalize_jailbreak(include);
        }

        if let Some(requested) = &update.selected_software {
            next.selected_software = self.compatible_software(&next.selected_product, requested);
        }

        next.total_price = self.pricing.calculate_total(&next);
        debug!("Configuration for {} repriced to {}", next.product_id(), next.total_price);
        Ok(self.commit(next))
    }

    /// Total of the current configuration, or 0 when nothing is selected
    pub fn calculate_total(&self) -> u32 {
        self.configuration
            .as_ref()
            .map(|c| self.pricing.calculate_total(c))
            .unwrap_or(0)
    }

    pub fn breakdown(&self) -> Option<PriceBreakdown> {
        self.configuration.as_ref().map(|c| self.pricing.breakdown(c))
    }

    /// Forget the configuration, in memory and in the store
    pub fn clear_configuration(&mut self) {
        self.configuration = None;
        if let Err(e) = self.store.remove(&self.storage_key) {
            error!("Failed to remove configuration {}: {}", self.storage_key, e);
        }
        info!("Cleared configuration {}", self.storage_key);
    }

    /// Load the persisted configuration and revalidate it against the
    /// current catalog. Anything unreadable is discarded; the engine then
    /// starts empty.
    pub fn restore(&mut self) -> Option<&ConfigurationState> {
        self.configuration = None;

        let raw = match self.store.get(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to read configuration {}: {}", self.storage_key, e);
                return None;
            }
        };

        let stored: ConfigurationState = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Discarding malformed configuration {}: {}", self.storage_key, e);
                self.discard();
                return None;
            }
        };

        let Some(state) = self.revalidate(stored) else {
            self.discard();
            return None;
        };

        Some(self.commit(state))
    }

    /// Rebuild a stored snapshot from the catalog: product and upgrades are
    /// re-resolved by id, selections the catalog no longer offers are dropped,
    /// and the total is recomputed.
    fn revalidate(&self, stored: ConfigurationState) -> Option<ConfigurationState> {
        let Some(product) = self.catalog().product(stored.product_id()).cloned() else {
            warn!("Stored configuration references unknown product {}", stored.product_id());
            return None;
        };

        let mut state = ConfigurationState::new(product);

        for (category, upgrade) in stored.selected_upgrades() {
            match state.selected_product.find_upgrade(category, &upgrade.id).cloned() {
                Some(current) => state.set_upgrade(category, Some(current)),
                None => warn!(
                    "Dropping {} upgrade {} no longer offered for {}",
                    category,
                    upgrade.id,
                    state.product_id()
                ),
            }
        }

        state.include_jailbreak = state.selected_product.normalize_jailbreak(stored.include_jailbreak);
        state.selected_software = self.compatible_software(&state.selected_product, &stored.selected_software);
        state.total_price = self.pricing.calculate_total(&state);

        if state.total_price != stored.total_price {
            info!(
                "Recomputed stored total for {}: {} -> {}",
                state.product_id(),
                stored.total_price,
                state.total_price
            );
        }

        Some(state)
    }

    fn lookup_product(&self, product_id: &str) -> Result<ProductConfig, ConfigurationError> {
        self.catalog()
            .product(product_id)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownProduct(product_id.to_string()))
    }

    fn compatible_software(&self, product: &ProductConfig, requested: &BTreeSet<String>) -> BTreeSet<String> {
        requested
            .iter()
            .filter(|id| {
                let ok = self
                    .catalog()
                    .addon(id)
                    .map(|a| a.is_available_for(&product.id))
                    .unwrap_or(false);
                if !ok {
                    warn!("Add-on {} not available for {}", id, product.id);
                }
                ok
            })
            .cloned()
            .collect()
    }

    fn commit(&mut self, state: ConfigurationState) -> &ConfigurationState {
        match serde_json::to_string(&state) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&self.storage_key, &raw) {
                    error!("Failed to persist configuration {}: {}", self.storage_key, e);
                }
            }
            Err(e) => error!("Failed to serialize configuration {}: {}", self.storage_key, e),
        }
        self.configuration.insert(state)
    }

    fn discard(&self) {
        if let Err(e) = self.store.remove(&self.storage_key) {
            error!("Failed to remove configuration {}: {}", self.storage_key, e);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("No product selected")]
    NoProductSelected,

    #[error("Product not found: {0}")]
    UnknownProduct(String),

    #[error("Upgrade {upgrade_id} is not a {category} option for {product_id}")]
    InvalidUpgrade {
        product_id: String,
        category: UpgradeCategory,
        upgrade_id: String,
    },
}
