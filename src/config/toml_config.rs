use crate::utils::error::{OrderError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file read with `--config`. Every key is optional; command line
/// flags win over it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderFileConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub order: OrderSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    pub endpoint: Option<String>,
    pub request_timeout_seconds: Option<u64>,
    pub app_key_env: Option<String>,
    pub app_secret_env: Option<String>,
    pub consumer_key_env: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderSection {
    pub country: Option<String>,
    pub quantity: Option<u32>,
    pub price_duration: Option<String>,
    pub price_mode: Option<String>,
    pub cart_expiry_hours: Option<u64>,
    pub auto_pay: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

impl OrderFileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        tracing::debug!("Loaded settings from {}", path.as_ref().display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;

        toml::from_str(&processed).map_err(|e| OrderError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| OrderError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let name = &caps[1];
            std::env::var(name).unwrap_or_else(|_| format!("${{{}}}", name))
        });
        Ok(result.into_owned())
    }
}

impl Validate for OrderFileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.api.endpoint {
            validate_non_empty_string("api.endpoint", endpoint)?;
        }
        if let Some(timeout) = self.api.request_timeout_seconds {
            validate_positive_number("api.request_timeout_seconds", timeout, 1)?;
        }
        for (field, value) in [
            ("api.app_key_env", &self.api.app_key_env),
            ("api.app_secret_env", &self.api.app_secret_env),
            ("api.consumer_key_env", &self.api.consumer_key_env),
            ("order.country", &self.order.country),
            ("order.price_duration", &self.order.price_duration),
            ("order.price_mode", &self.order.price_mode),
        ] {
            if let Some(value) = value {
                validate_non_empty_string(field, value)?;
            }
        }
        if let Some(quantity) = self.order.quantity {
            validate_positive_number("order.quantity", u64::from(quantity), 1)?;
        }
        if let Some(hours) = self.order.cart_expiry_hours {
            validate_positive_number("order.cart_expiry_hours", hours, 1)?;
        }
        if let Some(timeout) = self.order.timeout_seconds {
            validate_positive_number("order.timeout_seconds", timeout, 1)?;
        }
        Ok(())
    }
}
