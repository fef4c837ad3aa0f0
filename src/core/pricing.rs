use crate::domain::model::{
    PlanPrice, PlanPriceInfo, PriceConfig, DEFAULT_PRICING_MODE, DEFAULT_PRICING_TYPE,
    PRICING_CAPACITY_RENEW,
};

/// Picks the price tier to order the plan with.
///
/// The requested tier wins when the plan offers it. Otherwise falls back to
/// the first monthly, no-commitment, renewable rental tier, then to the
/// built-in default.
pub fn resolve_price_config(info: &PlanPriceInfo, requested: &PriceConfig) -> PriceConfig {
    if info
        .prices
        .iter()
        .any(|p| p.duration == requested.duration && p.pricing_mode == requested.pricing_mode)
    {
        return requested.clone();
    }

    match info.prices.iter().find(|p| is_standard_monthly(p)) {
        Some(price) => {
            let fallback = PriceConfig::new(&price.duration, &price.pricing_mode);
            tracing::warn!(
                "Price {} not offered for {}, falling back to {}",
                requested,
                info.plan_code,
                fallback
            );
            fallback
        }
        None => {
            tracing::warn!(
                "No usable price found for {}, using default {}",
                info.plan_code,
                PriceConfig::default()
            );
            PriceConfig::default()
        }
    }
}

fn is_standard_monthly(price: &PlanPrice) -> bool {
    price.interval == 1
        && price.pricing_mode == DEFAULT_PRICING_MODE
        && price.pricing_type == DEFAULT_PRICING_TYPE
        && price.capacities.iter().any(|c| c == PRICING_CAPACITY_RENEW)
}
