use crate::domain::model::{ItemOption, OptionCandidate, OptionSelector, PriceConfig};
use crate::utils::error::Result;
use crate::utils::validation::parse_key_value;

/// Selector value meaning "every value".
pub const WILDCARD: &str = "any";

impl OptionSelector {
    /// Parses `any`, `family=any` or `family=planCode`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(WILDCARD) {
            return Ok(OptionSelector::AllMandatory);
        }

        let (family, plan_code) = parse_key_value("item_option", raw)?;
        if plan_code.eq_ignore_ascii_case(WILDCARD) {
            Ok(OptionSelector::Family(family))
        } else {
            Ok(OptionSelector::Explicit(ItemOption::new(family, plan_code)))
        }
    }
}

pub fn parse_selectors(raw: &[String]) -> Result<Vec<OptionSelector>> {
    raw.iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| OptionSelector::parse(s))
        .collect()
}

/// Turns selectors and the catalog's candidates into the options to combine.
///
/// Per family, first match wins: explicit values, then a family wildcard,
/// then the bare wildcard (every mandatory value), and finally the cheapest
/// mandatory value under `price_config`. Families that are neither
/// requested nor mandatory are left out.
pub fn select_options(
    candidates: &[OptionCandidate],
    selectors: &[OptionSelector],
    price_config: &PriceConfig,
) -> Vec<ItemOption> {
    let mut selected: Vec<ItemOption> = Vec::new();

    for selector in selectors {
        if let OptionSelector::Explicit(option) = selector {
            if !candidates.iter().any(|c| &c.option == option) {
                tracing::warn!("Option {} is not listed in the catalog for this plan", option);
            }
            push_unique(&mut selected, option.clone());
        }
    }
    let mut settled: Vec<String> = selected.iter().map(|o| o.family.clone()).collect();

    for selector in selectors {
        if let OptionSelector::Family(family) = selector {
            if settled.contains(family) {
                continue;
            }
            let values: Vec<&OptionCandidate> =
                candidates.iter().filter(|c| &c.option.family == family).collect();
            if values.is_empty() {
                tracing::warn!("No option found in family '{}'", family);
                continue;
            }
            for candidate in values {
                push_unique(&mut selected, candidate.option.clone());
            }
            settled.push(family.clone());
        }
    }

    let all_mandatory = selectors.contains(&OptionSelector::AllMandatory);
    for family in mandatory_families(candidates) {
        if settled.iter().any(|f| f == family) {
            continue;
        }
        let values = candidates
            .iter()
            .filter(|c| c.mandatory && c.option.family == family);
        if all_mandatory {
            for candidate in values {
                push_unique(&mut selected, candidate.option.clone());
            }
        } else if let Some(cheapest) = cheapest(values, price_config) {
            tracing::debug!("Using cheapest mandatory option {}", cheapest.option);
            push_unique(&mut selected, cheapest.option.clone());
        }
        settled.push(family.to_string());
    }

    selected
}

fn push_unique(selected: &mut Vec<ItemOption>, option: ItemOption) {
    if !selected.contains(&option) {
        selected.push(option);
    }
}

/// Mandatory families in catalog order.
fn mandatory_families(candidates: &[OptionCandidate]) -> Vec<&str> {
    let mut families: Vec<&str> = Vec::new();
    for candidate in candidates.iter().filter(|c| c.mandatory) {
        if !families.contains(&candidate.option.family.as_str()) {
            families.push(&candidate.option.family);
        }
    }
    families
}

/// Cheapest candidate priced under `price_config`; unpriced ones rank last,
/// ties keep catalog order.
fn cheapest<'a>(
    candidates: impl Iterator<Item = &'a OptionCandidate>,
    price_config: &PriceConfig,
) -> Option<&'a OptionCandidate> {
    candidates.min_by_key(|c| match c.price_for(price_config) {
        Some(price) => (0, price.price_in_ucents),
        None => (1, 0),
    })
}
