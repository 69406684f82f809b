use serde::{Deserialize, Serialize};
use std::fmt;

/// Upgrade lists a product can carry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeCategory {
    Ram,
    Storage,
    External,
    Gpu,
}

impl UpgradeCategory {
    pub const ALL: [UpgradeCategory; 4] = [
        UpgradeCategory::Ram,
        UpgradeCategory::Storage,
        UpgradeCategory::External,
        UpgradeCategory::Gpu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeCategory::Ram => "ram",
            UpgradeCategory::Storage => "storage",
            UpgradeCategory::External => "external",
            UpgradeCategory::Gpu => "gpu",
        }
    }
}

impl fmt::Display for UpgradeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A priced hardware option attached to one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductUpgrade {
    pub id: String,
    pub name: String,
    pub price: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProductUpgrade {
    pub fn new(id: &str, name: &str, price: u32, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            price,
            description: Some(description.to_string()),
        }
    }
}

/// Immutable catalog entry for a TIM base unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductConfig {
    pub id: String,
    pub name: String,
    pub base_price: u32,
    pub processor: String,
    pub base_ram: String,
    pub base_storage: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ram_upgrades: Vec<ProductUpgrade>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage_upgrades: Vec<ProductUpgrade>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_upgrades: Vec<ProductUpgrade>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gpu_upgrades: Vec<ProductUpgrade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ram: Option<String>,
    #[serde(default)]
    pub allows_jailbreak: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jailbreak_price: Option<u32>,
    #[serde(default)]
    pub includes_jailbreak: bool,
    #[serde(default)]
    pub popular: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings: Option<String>,
}

impl ProductConfig {
    pub fn upgrades(&self, category: UpgradeCategory) -> &[ProductUpgrade] {
        match category {
            UpgradeCategory::Ram => &self.ram_upgrades,
            UpgradeCategory::Storage => &self.storage_upgrades,
            UpgradeCategory::External => &self.external_upgrades,
            UpgradeCategory::Gpu => &self.gpu_upgrades,
        }
    }

    /// Look an upgrade up in this product's own list only
    pub fn find_upgrade(&self, category: UpgradeCategory, upgrade_id: &str) -> Option<&ProductUpgrade> {
        self.upgrades(category).iter().find(|u| u.id == upgrade_id)
    }

    /// Categories for which this product offers at least one upgrade
    pub fn upgrade_categories(&self) -> Vec<UpgradeCategory> {
        UpgradeCategory::ALL
            .into_iter()
            .filter(|c| !self.upgrades(*c).is_empty())
            .collect()
    }

    /// Effective jailbreak flag for a requested one: always on for units
    /// that ship jailbroken, never on for units that disallow it
    pub fn normalize_jailbreak(&self, requested: bool) -> bool {
        self.includes_jailbreak || (requested && self.allows_jailbreak)
    }

    /// Price charged when the customer asks for the jailbreak unlock.
    /// Zero when the product disallows it or already ships with it.
    pub fn jailbreak_charge(&self) -> u32 {
        if !self.allows_jailbreak || self.includes_jailbreak {
            return 0;
        }
        self.jailbreak_price.unwrap_or(0)
    }
}

/// Software module sold alongside a base unit at a fixed bundle price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareAddon {
    pub id: String,
    pub name: String,
    pub description: String,
    pub full_price: u32,
    pub bundle_price: u32,
    #[serde(default)]
    pub available_for: Vec<String>,
}

impl SoftwareAddon {
    pub fn is_available_for(&self, product_id: &str) -> bool {
        self.available_for.iter().any(|p| p == product_id)
    }

    /// Discount granted when bought with hardware
    pub fn bundle_savings(&self) -> u32 {
        self.full_price.saturating_sub(self.bundle_price)
    }
}
