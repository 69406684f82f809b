use crate::product::{ProductConfig, ProductUpgrade, SoftwareAddon, UpgradeCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// The canonical product catalog. One source of truth for every price the
/// configurator charges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    pub products: Vec<ProductConfig>,
    #[serde(default)]
    pub addons: Vec<SoftwareAddon>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and dangling add-on references
    pub fn new(products: Vec<ProductConfig>, addons: Vec<SoftwareAddon>) -> Result<Self, CatalogError> {
        let catalog = Self { products, addons };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The shipped TIM line-up
    pub fn standard() -> Self {
        Self {
            products: standard_products(),
            addons: standard_addons(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog override file (JSON)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("{}: {}", path.display(), e)))?;
        let catalog = Self::from_json(&raw)?;
        info!(
            "Loaded catalog from {} ({} products, {} add-ons)",
            path.display(),
            catalog.products.len(),
            catalog.addons.len()
        );
        Ok(catalog)
    }

    pub fn products(&self) -> &[ProductConfig] {
        &self.products
    }

    pub fn product(&self, id: &str) -> Option<&ProductConfig> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn addons(&self) -> &[SoftwareAddon] {
        &self.addons
    }

    pub fn addon(&self, id: &str) -> Option<&SoftwareAddon> {
        self.addons.iter().find(|a| a.id == id)
    }

    /// Add-ons sellable with the given product
    pub fn addons_for(&self, product_id: &str) -> Vec<&SoftwareAddon> {
        self.addons
            .iter()
            .filter(|a| a.is_available_for(product_id))
            .collect()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut product_ids = HashSet::new();
        for product in &self.products {
            if !product_ids.insert(product.id.as_str()) {
                return Err(CatalogError::DuplicateProduct(product.id.clone()));
            }
            for category in UpgradeCategory::ALL {
                let mut seen = HashSet::new();
                for upgrade in product.upgrades(category) {
                    if !seen.insert(upgrade.id.as_str()) {
                        return Err(CatalogError::DuplicateUpgrade {
                            product_id: product.id.clone(),
                            category,
                            upgrade_id: upgrade.id.clone(),
                        });
                    }
                }
            }
        }

        let mut addon_ids = HashSet::new();
        for addon in &self.addons {
            if !addon_ids.insert(addon.id.as_str()) {
                return Err(CatalogError::DuplicateAddon(addon.id.clone()));
            }
            if let Some(missing) = addon.available_for.iter().find(|p| !product_ids.contains(p.as_str())) {
                return Err(CatalogError::UnknownProductReference {
                    addon_id: addon.id.clone(),
                    product_id: missing.clone(),
                });
            }
        }

        for product in &self.products {
            let ceiling = self.max_total(product);
            if ceiling > u32::MAX as u64 {
                return Err(CatalogError::PriceOverflow {
                    product_id: product.id.clone(),
                    total: ceiling,
                });
            }
        }

        Ok(())
    }

    /// Most expensive configuration of `product`: priciest option in every
    /// category, the jailbreak unlock and every compatible add-on
    fn max_total(&self, product: &ProductConfig) -> u64 {
        let upgrades: u64 = UpgradeCategory::ALL
            .into_iter()
            .filter_map(|c| product.upgrades(c).iter().map(|u| u.price as u64).max())
            .sum();
        let addons: u64 = self
            .addons_for(&product.id)
            .iter()
            .map(|a| a.bundle_price as u64)
            .sum();

        product.base_price as u64 + upgrades + product.jailbreak_charge() as u64 + addons
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate product id: {0}")]
    DuplicateProduct(String),

    #[error("Duplicate {category} upgrade {upgrade_id} on product {product_id}")]
    DuplicateUpgrade {
        product_id: String,
        category: UpgradeCategory,
        upgrade_id: String,
    },

    #[error("Duplicate add-on id: {0}")]
    DuplicateAddon(String),

    #[error("Add-on {addon_id} references unknown product {product_id}")]
    UnknownProductReference {
        addon_id: String,
        product_id: String,
    },

    #[error("Most expensive configuration of {product_id} ({total}) exceeds the price range")]
    PriceOverflow {
        product_id: String,
        total: u64,
    },

    #[error("Malformed catalog: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Catalog file error: {0}")]
    Io(String),
}

fn features(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn standard_products() -> Vec<ProductConfig> {
    vec![
        ProductConfig {
            id: "tiny-tim".to_string(),
            name: "Tiny TIM".to_string(),
            base_price: 299,
            processor: "N97".to_string(),
            base_ram: "8GB".to_string(),
            base_storage: "256GB M.2".to_string(),
            features: features(&["File Server", "Smart Home", "VPN Access"]),
            ram_upgrades: vec![],
            storage_upgrades: vec![],
            external_upgrades: vec![],
            gpu_upgrades: vec![],
            max_ram: None,
            allows_jailbreak: false,
            jailbreak_price: None,
            includes_jailbreak: false,
            popular: false,
            savings: None,
        },
        ProductConfig {
            id: "just-tim".to_string(),
            name: "Just TIM".to_string(),
            base_price: 449,
            processor: "N100".to_string(),
            base_ram: "16GB".to_string(),
            base_storage: "500GB M.2".to_string(),
            features: features(&["File Server", "Smart Home", "VPN Access"]),
            ram_upgrades: vec![ProductUpgrade::new("ram-32gb", "32GB", 100, "Upgrade to 32GB RAM")],
            storage_upgrades: vec![
                ProductUpgrade::new("storage-1tb", "1TB M.2", 100, "Upgrade to 1TB storage"),
                ProductUpgrade::new("storage-2tb", "2TB M.2", 250, "Upgrade to 2TB storage"),
            ],
            external_upgrades: vec![],
            gpu_upgrades: vec![],
            max_ram: None,
            allows_jailbreak: false,
            jailbreak_price: None,
            includes_jailbreak: false,
            popular: true,
            savings: Some("€50 vs upgrading Tiny TIM".to_string()),
        },
        ProductConfig {
            id: "tim-pro".to_string(),
            name: "TIM Pro".to_string(),
            base_price: 699,
            processor: "N200".to_string(),
            base_ram: "24GB (2x12)".to_string(),
            base_storage: "1TB M.2".to_string(),
            features: features(&["File Server", "Smart Home", "VPN Access"]),
            ram_upgrades: vec![],
            storage_upgrades: vec![ProductUpgrade::new("storage-2tb", "2TB M.2", 150, "Upgrade to 2TB storage")],
            external_upgrades: vec![],
            gpu_upgrades: vec![],
            max_ram: Some("24GB (max)".to_string()),
            allows_jailbreak: true,
            jailbreak_price: Some(350),
            includes_jailbreak: false,
            popular: false,
            savings: None,
        },
        ProductConfig {
            id: "tim-max".to_string(),
            name: "TIM Max".to_string(),
            base_price: 1299,
            processor: "Ryzen 5".to_string(),
            base_ram: "64GB".to_string(),
            base_storage: "2TB M.2".to_string(),
            features: features(&["All Features Included"]),
            ram_upgrades: vec![],
            storage_upgrades: vec![],
            external_upgrades: vec![
                ProductUpgrade::new("ext-4tb", "4TB External", 200, "Add 4TB external storage"),
                ProductUpgrade::new("ext-8tb", "8TB External", 400, "Add 8TB external storage"),
                ProductUpgrade::new("ext-10tb", "10TB External", 600, "Add 10TB external storage"),
            ],
            gpu_upgrades: vec![
                ProductUpgrade::new("rtx-3060", "RTX 3060", 300, "External RTX 3060 GPU"),
                ProductUpgrade::new("rtx-4060", "RTX 4060", 500, "External RTX 4060 GPU"),
                ProductUpgrade::new("rtx-4070", "RTX 4070", 700, "External RTX 4070 GPU"),
                ProductUpgrade::new("rtx-5060", "RTX 5060", 800, "External RTX 5060 GPU (Pre-order)"),
            ],
            max_ram: Some("64GB (max)".to_string()),
            allows_jailbreak: true,
            jailbreak_price: None,
            includes_jailbreak: true,
            popular: false,
            savings: None,
        },
    ]
}

fn standard_addons() -> Vec<SoftwareAddon> {
    let hardware = features(&["just-tim", "tim-pro", "tim-max"]);
    vec![
        SoftwareAddon {
            id: "game-streaming".to_string(),
            name: "Game Streaming".to_string(),
            description: "Stream games from your TIM to any device".to_string(),
            full_price: 199,
            bundle_price: 99,
            available_for: hardware.clone(),
        },
        SoftwareAddon {
            id: "downloads".to_string(),
            name: "Download Manager".to_string(),
            description: "Advanced download management and automation".to_string(),
            full_price: 99,
            bundle_price: 49,
            available_for: hardware,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = Catalog::standard();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.products().len(), 4);
        assert_eq!(catalog.product("just-tim").unwrap().base_price, 449);
        assert_eq!(catalog.addon("downloads").unwrap().bundle_price, 49);
    }

    #[test]
    fn test_addons_for_filters_by_compatibility() {
        let catalog = Catalog::standard();
        assert!(catalog.addons_for("tiny-tim").is_empty());
        assert_eq!(catalog.addons_for("tim-max").len(), 2);
    }

    #[test]
    fn test_same_upgrade_id_priced_per_product() {
        let catalog = Catalog::standard();
        let just = catalog.product("just-tim").unwrap();
        let pro = catalog.product("tim-pro").unwrap();
        assert_eq!(just.find_upgrade(UpgradeCategory::Storage, "storage-2tb").unwrap().price, 250);
        assert_eq!(pro.find_upgrade(UpgradeCategory::Storage, "storage-2tb").unwrap().price, 150);
    }

    #[test]
    fn test_json_round_trip_and_validation() {
        let raw = serde_json::to_string(&Catalog::standard()).unwrap();
        let parsed = Catalog::from_json(&raw).unwrap();
        assert_eq!(parsed, Catalog::standard());

        let mut broken = Catalog::standard();
        broken.addons[0].available_for.push("tim-ultra".to_string());
        let raw = serde_json::to_string(&broken).unwrap();
        assert!(matches!(
            Catalog::from_json(&raw),
            Err(CatalogError::UnknownProductReference { .. })
        ));
    }

    #[test]
    fn test_duplicate_product_rejected() {
        let mut products = standard_products();
        products.push(products[0].clone());
        assert!(matches!(
            Catalog::new(products, vec![]),
            Err(CatalogError::DuplicateProduct(id)) if id == "tiny-tim"
        ));
    }

    #[test]
    fn test_oversized_prices_rejected() {
        let mut catalog = Catalog::standard();
        catalog.products[1].base_price = u32::MAX;
        let raw = serde_json::to_string(&catalog).unwrap();

        assert!(matches!(
            Catalog::from_json(&raw),
            Err(CatalogError::PriceOverflow { product_id, .. }) if product_id == "just-tim"
        ));

        // Fits exactly when nothing can be added on top
        catalog.products[1].base_price = u32::MAX - 100 - 250 - 99 - 49;
        assert!(Catalog::new(catalog.products.clone(), catalog.addons.clone()).is_ok());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Catalog::from_json("{\"products\": 7}"), Err(CatalogError::Malformed(_))));
    }
}
