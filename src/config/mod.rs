#[cfg(feature = "cli")]
pub mod cli;
pub mod region;
pub mod toml_config;

use crate::domain::model::{Credentials, DatacenterSelection, OrderRequest};
use crate::utils::error::{OrderError, Result};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "ovh-eu";
pub const DEFAULT_COUNTRY: &str = "FR";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CART_EXPIRY_HOURS: u64 = 24;

pub const DEFAULT_APP_KEY_ENV: &str = "OVH_APP_KEY";
pub const DEFAULT_APP_SECRET_ENV: &str = "OVH_APP_SECRET";
pub const DEFAULT_CONSUMER_KEY_ENV: &str = "OVH_CONSUMER_KEY";

/// Everything one run needs, after merging flags, file and defaults.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub request: OrderRequest,
    pub base_url: String,
    pub request_timeout: Duration,
    /// Bound on the whole run, prompts included.
    pub deadline: Option<Duration>,
    pub fail_when_unavailable: bool,
}

/// Names of the environment variables holding the API credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialVars {
    pub app_key: String,
    pub app_secret: String,
    pub consumer_key: String,
}

impl Default for CredentialVars {
    fn default() -> Self {
        Self {
            app_key: DEFAULT_APP_KEY_ENV.to_string(),
            app_secret: DEFAULT_APP_SECRET_ENV.to_string(),
            consumer_key: DEFAULT_CONSUMER_KEY_ENV.to_string(),
        }
    }
}

impl CredentialVars {
    /// Reads the three variables through `lookup`. A missing or blank one is
    /// an error unless `optional`, in which case the run goes on without
    /// credentials.
    pub fn load<F>(&self, lookup: F, optional: bool) -> Result<Option<Credentials>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        match (
            read(&self.app_key),
            read(&self.app_secret),
            read(&self.consumer_key),
        ) {
            (Some(application_key), Some(application_secret), Some(consumer_key)) => {
                Ok(Some(Credentials {
                    application_key,
                    application_secret,
                    consumer_key,
                }))
            }
            (key, secret, _) if !optional => {
                let missing = if key.is_none() {
                    &self.app_key
                } else if secret.is_none() {
                    &self.app_secret
                } else {
                    &self.consumer_key
                };
                Err(OrderError::MissingConfigError {
                    field: format!("environment variable {}", missing),
                })
            }
            _ => Ok(None),
        }
    }
}

/// `any` anywhere in the list means every datacenter of the plan. An empty
/// list is refused so that no order goes to a location nobody picked.
pub fn parse_datacenters(raw: &[String]) -> Result<DatacenterSelection> {
    let listed: Vec<String> = raw
        .iter()
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect();

    if listed.is_empty() {
        return Err(OrderError::MissingConfigError {
            field: "datacenters".to_string(),
        });
    }
    if listed.iter().any(|d| d == crate::core::options::WILDCARD) {
        return Ok(DatacenterSelection::Any);
    }
    Ok(DatacenterSelection::Listed(listed))
}

pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
