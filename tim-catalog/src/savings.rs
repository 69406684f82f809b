//! Cloud-subscription comparison: what a TIM saves against the big storage
//! providers. Prices are static and refreshed with firmware releases.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudProvider {
    pub id: String,
    pub name: String,
    pub tiers: Vec<CloudTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudTier {
    pub id: String,
    pub name: String,
    /// GB
    pub storage: u32,
    /// EUR
    pub monthly_price: f64,
    /// EUR
    pub annual_price: f64,
    pub features: Vec<String>,
}

/// Hardware cost basis used for the comparison
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimModel {
    #[serde(rename = "tim-tiny")]
    Tiny,
    #[serde(rename = "tim-just")]
    Just,
    #[serde(rename = "tim-pro")]
    Pro,
    #[serde(rename = "tim-max")]
    Max,
}

impl TimModel {
    pub const ALL: [TimModel; 4] = [TimModel::Tiny, TimModel::Just, TimModel::Pro, TimModel::Max];

    /// GB
    pub fn storage(&self) -> u32 {
        match self {
            TimModel::Tiny => 256,
            TimModel::Just => 512,
            TimModel::Pro => 1000,
            TimModel::Max => 2000,
        }
    }

    /// One-time EUR
    pub fn cost(&self) -> u32 {
        match self {
            TimModel::Tiny => 149,
            TimModel::Just => 299,
            TimModel::Pro => 499,
            TimModel::Max => 799,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TimModel::Tiny => "TIM TINY",
            TimModel::Just => "TIM JUST",
            TimModel::Pro => "TIM PRO",
            TimModel::Max => "TIM MAX",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavingsCalculation {
    pub provider: String,
    pub tier: String,
    pub monthly_savings: f64,
    pub annual_savings: f64,
    pub break_even_months: u32,
    pub tim_storage: u32,
    pub tim_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifetimeSavings {
    pub provider: String,
    pub tier: String,
    pub total_savings: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelRecommendation {
    pub model: TimModel,
    pub name: String,
    pub cost: u32,
    pub storage: u32,
}

pub struct CloudPricingCalculator {
    providers: Vec<CloudProvider>,
}

impl CloudPricingCalculator {
    pub fn new(providers: Vec<CloudProvider>) -> Self {
        Self { providers }
    }

    /// Every tier that covers `storage_needed`, cheapest annual plan first.
    /// Tiers without a positive monthly price are skipped.
    pub fn calculate_savings(&self, model: TimModel, storage_needed: u32) -> Vec<SavingsCalculation> {
        let mut calculations: Vec<SavingsCalculation> = self
            .providers
            .iter()
            .flat_map(|provider| provider.tiers.iter().map(move |tier| (provider, tier)))
            .filter(|(_, tier)| tier.storage >= storage_needed && tier.monthly_price > 0.0)
            .map(|(provider, tier)| SavingsCalculation {
                provider: provider.name.clone(),
                tier: tier.name.clone(),
                monthly_savings: tier.monthly_price,
                annual_savings: tier.annual_price,
                break_even_months: (model.cost() as f64 / tier.monthly_price).ceil() as u32,
                tim_storage: model.storage(),
                tim_cost: model.cost(),
            })
            .collect();

        calculations.sort_by(|a, b| a.annual_savings.total_cmp(&b.annual_savings));
        calculations
    }

    /// Net savings after `years` of not paying for the subscription
    pub fn lifetime_savings(&self, model: TimModel, storage_needed: u32, years: u32) -> Vec<LifetimeSavings> {
        self.calculate_savings(model, storage_needed)
            .into_iter()
            .map(|calc| LifetimeSavings {
                total_savings: calc.annual_savings * years as f64 - model.cost() as f64,
                provider: calc.provider,
                tier: calc.tier,
            })
            .collect()
    }

    /// Cheapest model with enough storage, else the largest one
    pub fn recommend_model(&self, storage_needed: u32) -> ModelRecommendation {
        let model = TimModel::ALL
            .into_iter()
            .filter(|m| m.storage() >= storage_needed)
            .min_by_key(|m| m.cost())
            .or_else(|| TimModel::ALL.into_iter().max_by_key(|m| m.storage()))
            .unwrap_or(TimModel::Max);

        ModelRecommendation {
            model,
            name: model.display_name().to_string(),
            cost: model.cost(),
            storage: model.storage(),
        }
    }
}

impl Default for CloudPricingCalculator {
    fn default() -> Self {
        Self::new(standard_providers())
    }
}

fn tier(id: &str, name: &str, storage: u32, monthly_price: f64, annual_price: f64, features: &[&str]) -> CloudTier {
    CloudTier {
        id: id.to_string(),
        name: name.to_string(),
        storage,
        monthly_price,
        annual_price,
        features: features.iter().map(|f| f.to_string()).collect(),
    }
}

fn standard_providers() -> Vec<CloudProvider> {
    vec![
        CloudProvider {
            id: "onedrive".to_string(),
            name: "Microsoft OneDrive".to_string(),
            tiers: vec![
                tier("basic", "OneDrive Basic", 100, 2.0, 20.0, &["100 GB storage", "Office Online", "Email support"]),
                tier("personal", "Microsoft 365 Personal", 1000, 7.0, 69.0, &["1 TB storage", "Office apps", "Premium features"]),
                tier("family", "Microsoft 365 Family", 6000, 10.0, 99.0, &["6 TB total storage", "Up to 6 users", "Office apps"]),
            ],
        },
        CloudProvider {
            id: "icloud".to_string(),
            name: "Apple iCloud+".to_string(),
            tiers: vec![
                tier("50gb", "iCloud+ 50GB", 50, 0.99, 11.88, &["50 GB storage", "Private Relay", "Hide My Email"]),
                tier("200gb", "iCloud+ 200GB", 200, 2.99, 35.88, &["200 GB storage", "Family sharing", "Private Relay"]),
                tier("2tb", "iCloud+ 2TB", 2000, 9.99, 119.88, &["2 TB storage", "HomeKit Secure Video", "Private Relay"]),
            ],
        },
        CloudProvider {
            id: "google".to_string(),
            name: "Google Drive".to_string(),
            tiers: vec![
                tier("basic", "Google One Basic", 100, 1.99, 19.99, &["100 GB storage", "Premium support", "Shared with family"]),
                tier("standard", "Google One Standard", 200, 2.99, 29.99, &["200 GB storage", "Premium support", "VPN included"]),
                tier("premium", "Google One Premium", 2000, 9.99, 99.99, &["2 TB storage", "Premium features", "Advanced protection"]),
            ],
        },
        CloudProvider {
            id: "dropbox".to_string(),
            name: "Dropbox".to_string(),
            tiers: vec![
                tier("plus", "Dropbox Plus", 2000, 9.99, 99.99, &["2 TB storage", "Smart Sync", "30-day recovery"]),
                tier("family", "Dropbox Family", 2000, 16.99, 169.99, &["2 TB per user", "Up to 6 users", "Family room"]),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_savings_filtered_and_sorted() {
        let calc = CloudPricingCalculator::default();
        let rows = calc.calculate_savings(TimModel::Pro, 2000);

        // 2TB+ tiers: M365 Family, iCloud 2TB, Google Premium, Dropbox Plus, Dropbox Family
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].tier, "Microsoft 365 Family");
        assert_eq!(rows.last().unwrap().tier, "Dropbox Family");
        assert!(rows.windows(2).all(|w| w[0].annual_savings <= w[1].annual_savings));
    }

    #[test]
    fn test_break_even_rounds_up() {
        let calc = CloudPricingCalculator::default();
        let rows = calc.calculate_savings(TimModel::Max, 6000);
        assert_eq!(rows.len(), 1);
        // 799 / 10 = 79.9
        assert_eq!(rows[0].break_even_months, 80);
        assert_eq!(rows[0].tim_cost, 799);
    }

    #[test]
    fn test_lifetime_savings() {
        let calc = CloudPricingCalculator::default();
        let rows = calc.lifetime_savings(TimModel::Max, 6000, 5);
        assert_eq!(rows[0].total_savings, 99.0 * 5.0 - 799.0);
    }

    #[test]
    fn test_recommend_model() {
        let calc = CloudPricingCalculator::default();
        assert_eq!(calc.recommend_model(200).model, TimModel::Tiny);
        assert_eq!(calc.recommend_model(900).model, TimModel::Pro);

        let oversized = calc.recommend_model(10_000);
        assert_eq!(oversized.model, TimModel::Max);
        assert_eq!(oversized.name, "TIM MAX");
    }

    #[test]
    fn test_model_wire_names() {
        assert_eq!(serde_json::to_string(&TimModel::Just).unwrap(), "\"tim-just\"");
        let model: TimModel = serde_json::from_str("\"tim-tiny\"").unwrap();
        assert_eq!(model, TimModel::Tiny);
    }
}
