use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration label carrying the datacenter an item is delivered in.
pub const LOCATION_LABEL: &str = "dedicated_datacenter";
/// Configuration label carrying the commercial region of an item.
pub const REGION_LABEL: &str = "region";

/// P1M: one month. Other durations exist, e.g. P0D for installation fees, P1Y.
pub const DEFAULT_PRICE_DURATION: &str = "P1M";
/// No commitment. Other modes include degressivityX and upfrontX.
pub const DEFAULT_PRICING_MODE: &str = "default";
pub const DEFAULT_PRICING_TYPE: &str = "rental";
pub const PRICING_CAPACITY_RENEW: &str = "renew";

pub const DEFAULT_QUANTITY: u32 = 1;

/// One selectable value within an option family (memory, storage, bandwidth...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOption {
    pub family: String,
    pub plan_code: String,
}

impl ItemOption {
    pub fn new(family: impl Into<String>, plan_code: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            plan_code: plan_code.into(),
        }
    }
}

impl fmt::Display for ItemOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.family, self.plan_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionPrice {
    pub duration: String,
    pub pricing_mode: String,
    #[serde(default)]
    pub price_in_ucents: u64,
}

/// An option as listed by the catalog for a plan in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionCandidate {
    #[serde(flatten)]
    pub option: ItemOption,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub prices: Vec<OptionPrice>,
    #[serde(default)]
    pub product_name: String,
}

impl OptionCandidate {
    /// First price matching the duration and pricing mode of `price_config`.
    pub fn price_for(&self, price_config: &PriceConfig) -> Option<&OptionPrice> {
        self.prices.iter().find(|p| {
            p.duration == price_config.duration && p.pricing_mode == price_config.pricing_mode
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceConfig {
    pub duration: String,
    pub pricing_mode: String,
}

impl PriceConfig {
    pub fn new(duration: impl Into<String>, pricing_mode: impl Into<String>) -> Self {
        Self {
            duration: duration.into(),
            pricing_mode: pricing_mode.into(),
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_DURATION, DEFAULT_PRICING_MODE)
    }
}

impl fmt::Display for PriceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.duration, self.pricing_mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPrice {
    pub duration: String,
    pub pricing_mode: String,
    #[serde(default)]
    pub pricing_type: String,
    #[serde(default)]
    pub interval: u32,
    #[serde(default)]
    pub capacities: Vec<String>,
    #[serde(default)]
    pub price_in_ucents: u64,
}

/// Price tiers available for a plan in a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPriceInfo {
    pub plan_code: String,
    #[serde(default)]
    pub prices: Vec<PlanPrice>,
}

/// A cart-level setting the item requires, with its closed set of legal values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationField {
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub allowed_values: Vec<String>,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationRequest {
    pub label: String,
    pub value: String,
}

impl ConfigurationRequest {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ConfigurationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.label, self.value)
    }
}

/// A configuration accepted by the cart, identified for later removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedConfiguration {
    pub id: u64,
    #[serde(flatten)]
    pub request: ConfigurationRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    pub order_id: u64,
    pub url: String,
    /// Human readable total with tax, when the API reports it.
    pub total: Option<String>,
}

/// API credentials, only needed to assign and check out a cart.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub application_key: String,
    pub application_secret: String,
    pub consumer_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("application_key", &self.application_key)
            .field("application_secret", &"***")
            .field("consumer_key", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatacenterSelection {
    /// Every datacenter the plan's location field accepts, in catalog order.
    Any,
    Listed(Vec<String>),
}

/// How the caller wants add-on options chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSelector {
    /// `family=planCode`
    Explicit(ItemOption),
    /// `family=any`: every value of the family.
    Family(String),
    /// `any`: every value of every mandatory family.
    AllMandatory,
}

/// Fully parsed input of one order run.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub plan_code: String,
    pub subsidiary: String,
    pub quantity: u32,
    pub price_config: PriceConfig,
    pub datacenters: DatacenterSelection,
    pub options: Vec<OptionSelector>,
    /// Supplied by the caller, never overwritten.
    pub configurations: Vec<ConfigurationRequest>,
    /// Computed defaults, applied only to labels the item exposes.
    pub default_configurations: Vec<ConfigurationRequest>,
    pub cart_expiry: chrono::Duration,
    pub dry_run: bool,
    pub auto_pay: bool,
    pub credentials: Option<Credentials>,
}

impl OrderRequest {
    pub fn new(plan_code: impl Into<String>, subsidiary: impl Into<String>) -> Self {
        Self {
            plan_code: plan_code.into(),
            subsidiary: subsidiary.into(),
            quantity: DEFAULT_QUANTITY,
            price_config: PriceConfig::default(),
            datacenters: DatacenterSelection::Any,
            options: Vec::new(),
            configurations: Vec::new(),
            default_configurations: Vec::new(),
            cart_expiry: chrono::Duration::days(1),
            dry_run: false,
            auto_pay: false,
            credentials: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_candidate_decodes_catalog_payload() {
        let payload = serde_json::json!({
            "family": "memory",
            "planCode": "ram-32g-ecc-2133-24ska01",
            "mandatory": true,
            "productName": "32GB RAM",
            "prices": [
                {
                    "duration": "P1M",
                    "pricingMode": "default",
                    "priceInUcents": 0,
                    "price": {"text": "0.00 €"}
                },
                {"duration": "P12M", "pricingMode": "upfront12", "priceInUcents": 1000}
            ]
        });

        let candidate: OptionCandidate = serde_json::from_value(payload).unwrap();

        assert_eq!(candidate.option, ItemOption::new("memory", "ram-32g-ecc-2133-24ska01"));
        assert!(candidate.mandatory);
        assert_eq!(candidate.price_for(&PriceConfig::default()).unwrap().price_in_ucents, 0);
        assert!(candidate.price_for(&PriceConfig::new("P1Y", "default")).is_none());
    }

    #[test]
    fn test_configuration_field_defaults() {
        let field: ConfigurationField =
            serde_json::from_value(serde_json::json!({"label": "region"})).unwrap();

        assert!(!field.required);
        assert!(field.allowed_values.is_empty());
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let credentials = Credentials {
            application_key: "ak".to_string(),
            application_secret: "very-secret".to_string(),
            consumer_key: "ck-value".to_string(),
        };

        let debug = format!("{:?}", credentials);
        assert!(debug.contains("ak"));
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("ck-value"));
    }
}
