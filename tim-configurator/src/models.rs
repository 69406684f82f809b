use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tim_catalog::UpgradeCategory;

/// Partial edit of a configuration.
///
/// `upgrades`: a missing category is left alone, `None` deselects, `Some(id)`
/// selects. `selected_software`, when present, replaces the whole set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationUpdate {
    #[serde(default)]
    pub upgrades: BTreeMap<UpgradeCategory, Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_jailbreak: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_software: Option<BTreeSet<String>>,
}

impl ConfigurationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, category: UpgradeCategory, upgrade_id: &str) -> Self {
        self.upgrades.insert(category, Some(upgrade_id.to_string()));
        self
    }

    pub fn deselect(mut self, category: UpgradeCategory) -> Self {
        self.upgrades.insert(category, None);
        self
    }

    pub fn jailbreak(mut self, include: bool) -> Self {
        self.include_jailbreak = Some(include);
        self
    }

    pub fn software<I, S>(mut self, addon_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_software = Some(addon_ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty() && self.include_jailbreak.is_none() && self.selected_software.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_distinguishes_keep_and_clear() {
        let raw = r#"{"upgrades": {"ram": "ram-32gb", "storage": null}, "includeJailbreak": true}"#;
        let update: ConfigurationUpdate = serde_json::from_str(raw).unwrap();

        assert_eq!(update.upgrades.get(&UpgradeCategory::Ram), Some(&Some("ram-32gb".to_string())));
        assert_eq!(update.upgrades.get(&UpgradeCategory::Storage), Some(&None));
        assert!(!update.upgrades.contains_key(&UpgradeCategory::Gpu));
        assert_eq!(update.include_jailbreak, Some(true));
        assert!(update.selected_software.is_none());
    }

    #[test]
    fn test_builder() {
        let update = ConfigurationUpdate::new()
            .select(UpgradeCategory::Gpu, "rtx-4070")
            .deselect(UpgradeCategory::External)
            .software(["downloads"]);

        assert_eq!(update.upgrades.len(), 2);
        assert_eq!(update.selected_software.unwrap().len(), 1);
        assert!(ConfigurationUpdate::new().is_empty());
    }
}
