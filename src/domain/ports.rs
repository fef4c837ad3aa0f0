use crate::domain::model::{
    AppliedConfiguration, CheckoutResult, ConfigurationField, ConfigurationRequest, Credentials,
    ItemOption, OptionCandidate, PlanPriceInfo, PriceConfig,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Cart and catalog operations of the ordering API.
///
/// Cart and item identifiers are passed explicitly on every call; an
/// implementation holds no cart state of its own. Every call except
/// `assign_cart` and `checkout` works without credentials.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_cart(&self, subsidiary: &str, expire: DateTime<Utc>) -> Result<String>;

    async fn add_item(
        &self,
        cart_id: &str,
        plan_code: &str,
        quantity: u32,
        price_config: &PriceConfig,
    ) -> Result<u64>;

    async fn get_options(&self, cart_id: &str, plan_code: &str) -> Result<Vec<OptionCandidate>>;

    async fn get_price_info(&self, cart_id: &str, plan_code: &str) -> Result<PlanPriceInfo>;

    async fn get_required_configuration(
        &self,
        cart_id: &str,
        item_id: u64,
    ) -> Result<Vec<ConfigurationField>>;

    async fn add_configuration(
        &self,
        cart_id: &str,
        item_id: u64,
        configuration: &ConfigurationRequest,
    ) -> Result<AppliedConfiguration>;

    async fn remove_configuration(
        &self,
        cart_id: &str,
        item_id: u64,
        configuration_id: u64,
    ) -> Result<()>;

    /// Attaches `option` to the item and returns the id of the option's own
    /// cart item. Options accumulate on the item: the caller removes a
    /// previous option with `remove_item` before adding another of the same
    /// family.
    async fn configure_option(
        &self,
        cart_id: &str,
        item_id: u64,
        option: &ItemOption,
        price_config: &PriceConfig,
    ) -> Result<u64>;

    /// Deletes a cart item, such as an option added by `configure_option`.
    async fn remove_item(&self, cart_id: &str, item_id: u64) -> Result<()>;

    /// Returns a handle that signs its requests with `credentials`.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Self>
    where
        Self: Sized;

    async fn assign_cart(&self, cart_id: &str) -> Result<()>;

    async fn checkout(&self, cart_id: &str, auto_pay: bool) -> Result<CheckoutResult>;
}

/// Operator input used to settle configuration fields with several legal values.
#[async_trait]
pub trait Prompt: Send {
    /// Asks for a value of `field`; `attempt` starts at 0 and grows after each rejection.
    async fn ask(&mut self, field: &ConfigurationField, attempt: usize) -> Result<String>;

    /// Tells the operator why the previous answer was refused.
    async fn reject(&mut self, reason: &str) -> Result<()>;
}
