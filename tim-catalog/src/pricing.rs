use crate::catalog::Catalog;
use crate::configuration::ConfigurationState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of charge on a price line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineKind {
    Base,
    Upgrade,
    Jailbreak,
    Addon,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceLine {
    pub kind: LineKind,
    pub id: String,
    pub name: String,
    pub price: u32,
}

/// Itemized price of a configuration; `total()` is the sum of its lines
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub lines: Vec<PriceLine>,
}

impl PriceBreakdown {
    pub fn total(&self) -> u32 {
        self.lines.iter().fold(0u32, |total, l| total.saturating_add(l.price))
    }

    fn push(&mut self, kind: LineKind, id: &str, name: &str, price: u32) {
        self.lines.push(PriceLine {
            kind,
            id: id.to_string(),
            name: name.to_string(),
            price,
        });
    }
}

/// Prices configurations against the catalog.
///
/// Add-ons are charged their catalog bundle price, looked up by id, and only
/// when the add-on lists the selected product in `available_for`.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    catalog: Arc<Catalog>,
}

impl PricingEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Itemized price of `state`. Does not read `state.total_price`.
    pub fn breakdown(&self, state: &ConfigurationState) -> PriceBreakdown {
        let product = &state.selected_product;
        let mut breakdown = PriceBreakdown::default();

        breakdown.push(LineKind::Base, &product.id, &product.name, product.base_price);

        for (_, upgrade) in state.selected_upgrades() {
            breakdown.push(LineKind::Upgrade, &upgrade.id, &upgrade.name, upgrade.price);
        }

        if state.include_jailbreak && product.allows_jailbreak {
            breakdown.push(LineKind::Jailbreak, "jailbreak", "Jailbreak", product.jailbreak_charge());
        }

        for addon_id in &state.selected_software {
            if let Some(addon) = self.catalog.addon(addon_id) {
                if addon.is_available_for(&product.id) {
                    breakdown.push(LineKind::Addon, &addon.id, &addon.name, addon.bundle_price);
                }
            }
        }

        breakdown
    }

    /// Total price of `state`; pure, and never reads the cached total
    pub fn calculate_total(&self, state: &ConfigurationState) -> u32 {
        self.breakdown(state).total()
    }
}
