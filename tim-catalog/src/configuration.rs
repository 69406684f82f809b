use crate::product::{ProductConfig, ProductUpgrade, UpgradeCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One customer's product + upgrade + add-on selection.
///
/// `total_price` is derived. It is stored so persisted snapshots are
/// self-describing, but it is never trusted on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationState {
    pub selected_product: ProductConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_ram: Option<ProductUpgrade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_storage: Option<ProductUpgrade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_external: Option<ProductUpgrade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_gpu: Option<ProductUpgrade>,
    #[serde(default)]
    pub include_jailbreak: bool,
    #[serde(default)]
    pub selected_software: BTreeSet<String>,
    #[serde(default)]
    pub total_price: u32,
}

impl ConfigurationState {
    /// Fresh state for a product: no upgrades, no add-ons, base price.
    /// Units that ship jailbroken start with the flag set.
    pub fn new(product: ProductConfig) -> Self {
        let total_price = product.base_price;
        let include_jailbreak = product.includes_jailbreak;
        Self {
            selected_product: product,
            selected_ram: None,
            selected_storage: None,
            selected_external: None,
            selected_gpu: None,
            include_jailbreak,
            selected_software: BTreeSet::new(),
            total_price,
        }
    }

    pub fn product_id(&self) -> &str {
        &self.selected_product.id
    }

    pub fn upgrade(&self, category: UpgradeCategory) -> Option<&ProductUpgrade> {
        match category {
            UpgradeCategory::Ram => self.selected_ram.as_ref(),
            UpgradeCategory::Storage => self.selected_storage.as_ref(),
            UpgradeCategory::External => self.selected_external.as_ref(),
            UpgradeCategory::Gpu => self.selected_gpu.as_ref(),
        }
    }

    pub fn set_upgrade(&mut self, category: UpgradeCategory, upgrade: Option<ProductUpgrade>) {
        let slot = match category {
            UpgradeCategory::Ram => &mut self.selected_ram,
            UpgradeCategory::Storage => &mut self.selected_storage,
            UpgradeCategory::External => &mut self.selected_external,
            UpgradeCategory::Gpu => &mut self.selected_gpu,
        };
        *slot = upgrade;
    }

    /// Selected upgrades in category order
    pub fn selected_upgrades(&self) -> Vec<(UpgradeCategory, &ProductUpgrade)> {
        UpgradeCategory::ALL
            .into_iter()
            .filter_map(|c| self.upgrade(c).map(|u| (c, u)))
            .collect()
    }
}
