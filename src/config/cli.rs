use crate::config::region::{base_url_for, check_country};
use crate::config::toml_config::OrderFileConfig;
use crate::config::{
    parse_datacenters, CredentialVars, RunSettings, DEFAULT_APP_KEY_ENV, DEFAULT_APP_SECRET_ENV,
    DEFAULT_CART_EXPIRY_HOURS, DEFAULT_CONSUMER_KEY_ENV, DEFAULT_COUNTRY, DEFAULT_ENDPOINT,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::core::options::parse_selectors;
use crate::domain::model::{
    ConfigurationRequest, OrderRequest, PriceConfig, DEFAULT_PRICE_DURATION, DEFAULT_PRICING_MODE,
    REGION_LABEL,
};
use crate::utils::error::{OrderError, Result};
use crate::utils::validation::{parse_key_value, validate_positive_number, Validate};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "kimsufi-order", version)]
#[command(
    about = "Order a dedicated server, walking every option combination and datacenter \
             until one is available"
)]
pub struct CliConfig {
    /// Plan code of the server, e.g. 24ska01
    #[arg(short = 'p', long)]
    pub plan_code: String,

    /// Comma separated datacenters to try in order, or `any`
    #[arg(short = 'd', long, value_delimiter = ',', required = true)]
    pub datacenters: Vec<String>,

    /// `family=planCode`, `family=any` or `any`, comma separated
    #[arg(short = 'o', long = "item-option", value_delimiter = ',')]
    pub item_options: Vec<String>,

    /// `label=value` cart item configurations, comma separated
    #[arg(short = 'i', long = "item-configuration", value_delimiter = ',')]
    pub item_configurations: Vec<String>,

    #[arg(short = 'q', long)]
    pub quantity: Option<u32>,

    /// Billing period, e.g. P1M or P12M
    #[arg(long)]
    pub price_duration: Option<String>,

    /// Pricing mode, e.g. default or upfront12
    #[arg(long)]
    pub price_mode: Option<String>,

    /// Subsidiary country code
    #[arg(short = 'c', long)]
    pub country: Option<String>,

    /// ovh-eu, ovh-ca, ovh-us or a base URL
    #[arg(short = 'e', long)]
    pub endpoint: Option<String>,

    /// Prepare the cart and list the attempts without ordering
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Pay with the account's preferred payment method
    #[arg(long)]
    pub auto_pay: bool,

    #[arg(long)]
    pub app_key_env: Option<String>,

    #[arg(long)]
    pub app_secret_env: Option<String>,

    #[arg(long)]
    pub consumer_key_env: Option<String>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// TOML settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Exit with status 2 when nothing was available
    #[arg(long)]
    pub fail_when_unavailable: bool,

    #[arg(short = 'v', long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log JSON lines instead of text
    #[arg(long)]
    pub json_logs: bool,
}

impl CliConfig {
    pub fn load_file(&self) -> Result<OrderFileConfig> {
        match &self.config {
            Some(path) => {
                let file = OrderFileConfig::from_file(path)?;
                file.validate()?;
                Ok(file)
            }
            None => Ok(OrderFileConfig::default()),
        }
    }

    /// Merges flags over `file` over built-in defaults.
    pub fn resolve<F>(&self, file: &OrderFileConfig, env: F) -> Result<RunSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = first(&self.endpoint, &file.api.endpoint, DEFAULT_ENDPOINT);
        let country = first(&self.country, &file.order.country, DEFAULT_COUNTRY).to_uppercase();
        let base_url = base_url_for(&endpoint)?;
        let region_name = check_country(&endpoint, &country)?;

        let quantity = self.quantity.or(file.order.quantity).unwrap_or(1);
        validate_positive_number("quantity", u64::from(quantity), 1)?;

        let price_config = PriceConfig::new(
            first(&self.price_duration, &file.order.price_duration, DEFAULT_PRICE_DURATION),
            first(&self.price_mode, &file.order.price_mode, DEFAULT_PRICING_MODE),
        );

        let configurations = self
            .item_configurations
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| {
                parse_key_value("item_configuration", c)
                    .map(|(label, value)| ConfigurationRequest::new(label, value))
            })
            .collect::<Result<Vec<_>>>()?;

        let vars = CredentialVars {
            app_key: first(&self.app_key_env, &file.api.app_key_env, DEFAULT_APP_KEY_ENV),
            app_secret: first(
                &self.app_secret_env,
                &file.api.app_secret_env,
                DEFAULT_APP_SECRET_ENV,
            ),
            consumer_key: first(
                &self.consumer_key_env,
                &file.api.consumer_key_env,
                DEFAULT_CONSUMER_KEY_ENV,
            ),
        };
        let credentials = vars.load(env, self.dry_run)?;

        let expiry_hours = file.order.cart_expiry_hours.unwrap_or(DEFAULT_CART_EXPIRY_HOURS);
        let cart_expiry = i64::try_from(expiry_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .ok_or_else(|| OrderError::InvalidConfigValueError {
                field: "order.cart_expiry_hours".to_string(),
                value: expiry_hours.to_string(),
                reason: "out of range".to_string(),
            })?;
        let deadline = match self.timeout.or(file.order.timeout_seconds) {
            Some(seconds) => {
                validate_positive_number("timeout", seconds, 1)?;
                Some(Duration::from_secs(seconds))
            }
            None => None,
        };

        let mut request = OrderRequest::new(self.plan_code.trim(), country);
        request.quantity = quantity;
        request.price_config = price_config;
        request.datacenters = parse_datacenters(&self.datacenters)?;
        request.options = parse_selectors(&self.item_options)?;
        request.configurations = configurations;
        request.default_configurations = region_name
            .map(|name| vec![ConfigurationRequest::new(REGION_LABEL, name)])
            .unwrap_or_default();
        request.cart_expiry = cart_expiry;
        request.dry_run = self.dry_run;
        request.auto_pay = self.auto_pay || file.order.auto_pay.unwrap_or(false);
        request.credentials = credentials;
        request.validate()?;

        Ok(RunSettings {
            request,
            base_url,
            request_timeout: Duration::from_secs(
                file.api.request_timeout_seconds.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            deadline,
            fail_when_unavailable: self.fail_when_unavailable,
        })
    }
}

fn first(flag: &Option<String>, file: &Option<String>, default: &str) -> String {
    flag.as_deref()
        .or(file.as_deref())
        .unwrap_or(default)
        .trim()
        .to_string()
}
