use serde::{Deserialize, Serialize};
use tim_catalog::{Catalog, ProductConfig};

/// Entry-level units that are better replaced than upgraded
const UPGRADE_PATHS: &[(&str, &str)] = &[("tiny-tim", "just-tim")];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecChange {
    pub from: String,
    pub to: String,
}

/// "Need more power?" recommendation shown next to an entry-level unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSuggestion {
    pub from_product: String,
    pub to_product: String,
    pub to_name: String,
    pub processor: SpecChange,
    pub ram: SpecChange,
    pub storage: SpecChange,
    /// Extra base price of the suggested unit
    pub price_difference: u32,
    pub savings: Option<String>,
}

fn change(from: &str, to: &str) -> SpecChange {
    SpecChange {
        from: from.to_string(),
        to: to.to_string(),
    }
}

pub fn suggest_upgrade(catalog: &Catalog, product_id: &str) -> Option<UpgradeSuggestion> {
    let (_, target_id) = UPGRADE_PATHS.iter().find(|(from, _)| *from == product_id)?;
    let current = catalog.product(product_id)?;
    let target = catalog.product(target_id)?;
    Some(build(current, target))
}

fn build(current: &ProductConfig, target: &ProductConfig) -> UpgradeSuggestion {
    UpgradeSuggestion {
        from_product: current.id.clone(),
        to_product: target.id.clone(),
        to_name: target.name.clone(),
        processor: change(&current.processor, &target.processor),
        ram: change(&current.base_ram, &target.base_ram),
        storage: change(&current.base_storage, &target.base_storage),
        price_difference: target.base_price.saturating_sub(current.base_price),
        savings: target.savings.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiny_tim_suggests_just_tim() {
        let catalog = Catalog::standard();
        let suggestion = suggest_upgrade(&catalog, "tiny-tim").unwrap();

        assert_eq!(suggestion.to_product, "just-tim");
        assert_eq!(suggestion.processor, change("N97", "N100"));
        assert_eq!(suggestion.ram, change("8GB", "16GB"));
        assert_eq!(suggestion.storage, change("256GB M.2", "500GB M.2"));
        assert_eq!(suggestion.price_difference, 150);
        assert_eq!(suggestion.savings.as_deref(), Some("€50 vs upgrading Tiny TIM"));
    }

    #[test]
    fn test_no_suggestion_for_larger_units() {
        let catalog = Catalog::standard();
        assert!(suggest_upgrade(&catalog, "just-tim").is_none());
        assert!(suggest_upgrade(&catalog, "tim-max").is_none());
        assert!(suggest_upgrade(&catalog, "unknown").is_none());
    }
}
