use crate::utils::error::{OrderError, Result};

/// A known API endpoint and the subsidiaries it sells for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub endpoint: &'static str,
    pub base_url: &'static str,
    /// Value of the `region` cart configuration, when the endpoint has one.
    pub name: Option<&'static str>,
    pub countries: &'static [&'static str],
}

pub const REGIONS: &[Region] = &[
    Region {
        endpoint: "ovh-eu",
        base_url: "https://eu.api.ovh.com/1.0",
        name: Some("europe"),
        countries: &[
            "CZ", "DE", "ES", "FI", "FR", "GB", "IE", "IT", "LT", "MA", "NL", "PL", "PT", "SN",
            "TN",
        ],
    },
    Region {
        endpoint: "ovh-ca",
        base_url: "https://ca.api.ovh.com/1.0",
        name: Some("canada"),
        countries: &["ASIA", "AU", "CA", "IN", "QC", "SG", "WE", "WS"],
    },
    Region {
        endpoint: "ovh-us",
        base_url: "https://api.us.ovhcloud.com/1.0",
        name: None,
        countries: &["US"],
    },
];

pub fn region_for_endpoint(endpoint: &str) -> Option<&'static Region> {
    REGIONS.iter().find(|r| r.endpoint.eq_ignore_ascii_case(endpoint))
}

pub fn region_for_country(country: &str) -> Option<&'static Region> {
    REGIONS
        .iter()
        .find(|r| r.countries.iter().any(|c| c.eq_ignore_ascii_case(country)))
}

pub fn known_endpoints() -> Vec<&'static str> {
    REGIONS.iter().map(|r| r.endpoint).collect()
}

fn is_custom_url(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}

/// Resolves an endpoint name or a custom `http(s)://` URL to an API base URL.
pub fn base_url_for(endpoint: &str) -> Result<String> {
    if is_custom_url(endpoint) {
        crate::utils::validation::validate_url("endpoint", endpoint)?;
        return Ok(endpoint.trim_end_matches('/').to_string());
    }

    region_for_endpoint(endpoint)
        .map(|r| r.base_url.to_string())
        .ok_or_else(|| OrderError::InvalidConfigValueError {
            field: "endpoint".to_string(),
            value: endpoint.to_string(),
            reason: format!("expected an http(s) URL or one of {}", known_endpoints().join(", ")),
        })
}

/// Checks that `country` is sold through `endpoint` and returns the region
/// name to use as default `region` configuration. Custom URLs are not checked.
pub fn check_country(endpoint: &str, country: &str) -> Result<Option<&'static str>> {
    if is_custom_url(endpoint) {
        return Ok(None);
    }

    let region = region_for_endpoint(endpoint).ok_or_else(|| OrderError::InvalidConfigValueError {
        field: "endpoint".to_string(),
        value: endpoint.to_string(),
        reason: format!("expected one of {}", known_endpoints().join(", ")),
    })?;

    if !region.countries.iter().any(|c| c.eq_ignore_ascii_case(country)) {
        let hint = region_for_country(country)
            .map(|r| format!(", use endpoint {}", r.endpoint))
            .unwrap_or_default();
        return Err(OrderError::InvalidConfigValueError {
            field: "country".to_string(),
            value: country.to_string(),
            reason: format!(
                "not sold through {} (valid: {}){}",
                region.endpoint,
                region.countries.join(", "),
                hint
            ),
        });
    }

    Ok(region.name)
}
