use crate::core::combinations::{generate_combinations, Combination};
use crate::core::options::select_options;
use crate::core::pricing::resolve_price_config;
use crate::core::resolver::ConfigurationResolver;
use crate::domain::model::{
    CheckoutResult, ConfigurationField, ConfigurationRequest, DatacenterSelection, ItemOption,
    OrderRequest, LOCATION_LABEL,
};
use crate::domain::ports::{OrderService, Prompt};
use crate::utils::error::{OrderError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_required_field, Validate,
};
use chrono::Utc;
use std::fmt;
use std::time::Duration;

/// Where an order run stands. `Completed`, `Exhausted`, `DryRun` and
/// `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Pending,
    CartCreated,
    ItemAdded,
    Configured,
    ReadyToAttempt,
    Completed,
    Exhausted,
    DryRun,
    Aborted,
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedOrder {
    pub cart_id: String,
    pub combination: Combination,
    pub datacenter: String,
    pub checkout: CheckoutResult,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    Completed(CompletedOrder),
    /// Every combination and datacenter was refused as not available.
    Exhausted { attempts: usize },
    /// Stopped before assigning the cart.
    DryRun {
        combinations: usize,
        datacenters: Vec<String>,
    },
}

impl OrderOutcome {
    pub fn state(&self) -> OrderState {
        match self {
            OrderOutcome::Completed(_) => OrderState::Completed,
            OrderOutcome::Exhausted { .. } => OrderState::Exhausted,
            OrderOutcome::DryRun { .. } => OrderState::DryRun,
        }
    }
}

impl Validate for OrderRequest {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("plan_code", &self.plan_code)?;
        validate_non_empty_string("country", &self.subsidiary)?;
        validate_positive_number("quantity", u64::from(self.quantity), 1)?;

        if let DatacenterSelection::Listed(datacenters) = &self.datacenters {
            if datacenters.iter().all(|d| d.trim().is_empty()) {
                return Err(OrderError::MissingConfigError {
                    field: "datacenters".to_string(),
                });
            }
        }

        if !self.dry_run {
            validate_required_field("credentials", &self.credentials)?;
        }
        Ok(())
    }
}

/// Tracks the current state and logs each transition.
struct Progress {
    state: OrderState,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: OrderState::Pending,
        }
    }

    fn advance(&mut self, next: OrderState) {
        tracing::info!("🔄 Order state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Wraps `source` with the failed operation and moves to `Aborted`.
    fn abort(
        &mut self,
        operation: &str,
        context: impl Into<String>,
        source: OrderError,
    ) -> OrderError {
        let failed_in = self.state;
        self.advance(OrderState::Aborted);
        OrderError::Aborted {
            state: failed_in,
            operation: operation.to_string(),
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Drives one cart from creation to checkout.
///
/// Runs strictly one call at a time against the cart. Checkout succeeds at
/// most once per run: the first success ends the run.
pub struct OrderOrchestrator<S: OrderService, P: Prompt> {
    service: S,
    prompt: P,
}

impl<S: OrderService, P: Prompt> OrderOrchestrator<S, P> {
    pub fn new(service: S, prompt: P) -> Self {
        Self { service, prompt }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn into_parts(self) -> (S, P) {
        (self.service, self.prompt)
    }

    /// `run` bounded by `deadline`, prompts included.
    pub async fn run_with_deadline(
        &mut self,
        request: &OrderRequest,
        deadline: Option<Duration>,
    ) -> Result<OrderOutcome> {
        match deadline {
            Some(limit) => tokio::time::timeout(limit, self.run(request))
                .await
                .map_err(|_| OrderError::DeadlineExceeded {
                    seconds: limit.as_secs(),
                })?,
            None => self.run(request).await,
        }
    }

    pub async fn run(&mut self, request: &OrderRequest) -> Result<OrderOutcome> {
        request.validate()?;

        let mut progress = Progress::new();
        let plan = request.plan_code.as_str();

        tracing::info!("🛒 Creating cart for {} in {}", plan, request.subsidiary);
        let expire = Utc::now() + request.cart_expiry;
        let cart_id = self
            .service
            .create_cart(&request.subsidiary, expire)
            .await
            .map_err(|e| {
                let context = format!("subsidiary={}", request.subsidiary);
                progress.abort("create cart", context, e)
            })?;
        progress.advance(OrderState::CartCreated);
        tracing::debug!("Cart {} expires at {}", cart_id, expire.to_rfc3339());

        let price_info = self
            .service
            .get_price_info(&cart_id, plan)
            .await
            .map_err(|e| progress.abort("get price info", format!("plan={}", plan), e))?;
        let price_config = resolve_price_config(&price_info, &request.price_config);

        let item_id = self
            .service
            .add_item(&cart_id, plan, request.quantity, &price_config)
            .await
            .map_err(|e| {
                progress.abort("add item", format!("plan={} price={}", plan, price_config), e)
            })?;
        progress.advance(OrderState::ItemAdded);
        tracing::info!(
            "📦 Added {} x{} ({}) as item {}",
            plan,
            request.quantity,
            price_config,
            item_id
        );

        let fields = self
            .service
            .get_required_configuration(&cart_id, item_id)
            .await
            .map_err(|e| {
                progress.abort("get required configuration", format!("item={}", item_id), e)
            })?;
        let (location_field, other_fields): (Vec<ConfigurationField>, Vec<ConfigurationField>) =
            fields.into_iter().partition(|f| f.label == LOCATION_LABEL);
        let location_field = location_field.into_iter().next();

        let known = known_configurations(request, &other_fields);
        let resolved = ConfigurationResolver::new(&mut self.prompt)
            .resolve(&other_fields, &known)
            .await
            .map_err(|e| {
                progress.abort("resolve configuration", format!("item={}", item_id), e)
            })?;

        for configuration in known.iter().chain(resolved.iter()) {
            self.service
                .add_configuration(&cart_id, item_id, configuration)
                .await
                .map_err(|e| {
                    let context = format!("configuration={}", configuration);
                    progress.abort("add configuration", context, e)
                })?;
            tracing::debug!("Configured {}", configuration);
        }
        progress.advance(OrderState::Configured);

        let candidates = self
            .service
            .get_options(&cart_id, plan)
            .await
            .map_err(|e| progress.abort("get options", format!("plan={}", plan), e))?;
        let options = select_options(&candidates, &request.options, &price_config);
        let mut combinations = generate_combinations(&options);
        if combinations.is_empty() {
            // plans without add-ons still get one attempt per datacenter
            combinations.push(Combination::new());
        }

        let datacenters = resolve_datacenters(&request.datacenters, location_field.as_ref())
            .map_err(|e| progress.abort("resolve datacenters", format!("plan={}", plan), e))?;
        progress.advance(OrderState::ReadyToAttempt);
        tracing::info!(
            "🎯 {} combination(s) x {} datacenter(s) = {} attempt(s) at most",
            combinations.len(),
            datacenters.len(),
            combinations.len() * datacenters.len()
        );
        for combination in &combinations {
            tracing::debug!("Combination: {}", combination);
        }

        if request.dry_run {
            progress.advance(OrderState::DryRun);
            tracing::info!("🔍 DRY RUN MODE - cart {} left unassigned", cart_id);
            return Ok(OrderOutcome::DryRun {
                combinations: combinations.len(),
                datacenters,
            });
        }

        let credentials = validate_required_field("credentials", &request.credentials)?;
        let account = self
            .service
            .authenticate(credentials)
            .await
            .map_err(|e| progress.abort("authenticate", "assign phase", e))?;
        account
            .assign_cart(&cart_id)
            .await
            .map_err(|e| progress.abort("assign cart", format!("cart={}", cart_id), e))?;
        tracing::info!("🔐 Cart {} assigned to account", cart_id);

        let mut attempts = 0;
        // option cart items currently attached to the server item
        let mut active: Vec<(ItemOption, u64)> = Vec::new();
        for combination in &combinations {
            let wanted = combination.options();

            let mut kept = Vec::with_capacity(active.len());
            for (option, option_item) in active.drain(..) {
                if wanted.contains(&option) {
                    kept.push((option, option_item));
                    continue;
                }
                self.service
                    .remove_item(&cart_id, option_item)
                    .await
                    .map_err(|e| progress.abort("remove option", format!("option={}", option), e))?;
                tracing::debug!("Removed option {} (item {})", option, option_item);
            }
            active = kept;

            for option in wanted {
                if active.iter().any(|(current, _)| current == option) {
                    continue;
                }
                let option_item = self
                    .service
                    .configure_option(&cart_id, item_id, option, &price_config)
                    .await
                    .map_err(|e| {
                        progress.abort("configure option", format!("option={}", option), e)
                    })?;
                tracing::debug!("Configured option {} as item {}", option, option_item);
                active.push((option.clone(), option_item));
            }

            for datacenter in &datacenters {
                let context = || format!("combination=[{}] datacenter={}", combination, datacenter);

                let applied = self
                    .service
                    .add_configuration(
                        &cart_id,
                        item_id,
                        &ConfigurationRequest::new(LOCATION_LABEL, datacenter),
                    )
                    .await
                    .map_err(|e| progress.abort("add datacenter", context(), e))?;

                attempts += 1;
                tracing::info!("💳 Checkout attempt {}: {}", attempts, context());
                match account.checkout(&cart_id, request.auto_pay).await {
                    Ok(checkout) => {
                        progress.advance(OrderState::Completed);
                        return Ok(OrderOutcome::Completed(CompletedOrder {
                            cart_id,
                            combination: combination.clone(),
                            datacenter: datacenter.clone(),
                            checkout,
                            attempts,
                        }));
                    }
                    Err(e) if e.is_not_available() => {
                        tracing::warn!("❌ Not available: {} ({})", context(), e);
                        self.service
                            .remove_configuration(&cart_id, item_id, applied.id)
                            .await
                            .map_err(|e| progress.abort("remove datacenter", context(), e))?;
                    }
                    Err(e) => return Err(progress.abort("checkout", context(), e)),
                }
            }
        }

        progress.advance(OrderState::Exhausted);
        tracing::warn!("Nothing available after {} attempt(s)", attempts);
        Ok(OrderOutcome::Exhausted { attempts })
    }
}

/// Caller configurations, then computed defaults for labels the item exposes.
/// The datacenter label is left to the attempt loop.
fn known_configurations(
    request: &OrderRequest,
    fields: &[ConfigurationField],
) -> Vec<ConfigurationRequest> {
    let mut known: Vec<ConfigurationRequest> = Vec::new();

    for configuration in &request.configurations {
        if configuration.label == LOCATION_LABEL {
            tracing::warn!("Ignoring {}, use --datacenters instead", configuration);
            continue;
        }
        if !known.iter().any(|k| k.label == configuration.label) {
            known.push(configuration.clone());
        }
    }

    for default in &request.default_configurations {
        let exposed = fields.iter().any(|f| f.label == default.label);
        if exposed && !known.iter().any(|k| k.label == default.label) {
            known.push(default.clone());
        }
    }

    known
}

fn resolve_datacenters(
    selection: &DatacenterSelection,
    location_field: Option<&ConfigurationField>,
) -> Result<Vec<String>> {
    let allowed = location_field
        .map(|f| f.allowed_values.as_slice())
        .unwrap_or_default();

    match selection {
        DatacenterSelection::Any => {
            if allowed.is_empty() {
                return Err(OrderError::validation(
                    "the plan exposes no datacenter values, list datacenters explicitly",
                ));
            }
            Ok(allowed.to_vec())
        }
        DatacenterSelection::Listed(listed) => {
            let mut datacenters: Vec<String> = Vec::new();
            for datacenter in listed.iter().map(|d| d.trim()).filter(|d| !d.is_empty()) {
                if !allowed.is_empty() && !allowed.iter().any(|a| a == datacenter) {
                    tracing::warn!(
                        "Datacenter {} is not offered for this plan (allowed: {})",
                        datacenter,
                        allowed.join(", ")
                    );
                    continue;
                }
                if !datacenters.iter().any(|d| d == datacenter) {
                    datacenters.push(datacenter.to_string());
                }
            }

            if datacenters.is_empty() {
                return Err(OrderError::InvalidConfigValueError {
                    field: "datacenters".to_string(),
                    value: listed.join(","),
                    reason: format!("none offered for this plan (allowed: {})", allowed.join(", ")),
                });
            }
            Ok(datacenters)
        }
    }
}
