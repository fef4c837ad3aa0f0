use crate::domain::model::{
    AppliedConfiguration, CheckoutResult, ConfigurationField, ConfigurationRequest, Credentials,
    ItemOption, OptionCandidate, PlanPriceInfo, PriceConfig, DEFAULT_QUANTITY,
};
use crate::domain::ports::OrderService;
use crate::utils::error::{OrderError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::time::Duration;
use url::Url;

const CART_DESCRIPTION: &str = "kimsufi-order";
const NOT_AVAILABLE_MARKER: &str = "is not available in";

#[derive(Debug, Clone)]
struct Signer {
    credentials: Credentials,
    /// Server clock minus local clock, in seconds.
    time_delta: i64,
}

/// `OrderService` backed by the OVHcloud REST API.
#[derive(Debug, Clone)]
pub struct OvhClient {
    client: Client,
    base_url: String,
    signer: Option<Signer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CartRequest<'a> {
    description: &'a str,
    expire: String,
    ovh_subsidiary: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartResponse {
    cart_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EcoItemRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    item_id: Option<u64>,
    plan_code: &'a str,
    quantity: u32,
    #[serde(flatten)]
    price_config: &'a PriceConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EcoItemResponse {
    item_id: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest {
    auto_pay_with_preferred_payment_method: bool,
    waive_retractation_period: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutResponse {
    #[serde(default)]
    order_id: Option<u64>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    prices: Option<CheckoutPrices>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutPrices {
    #[serde(default)]
    with_tax: Option<PriceText>,
}

#[derive(Debug, Deserialize)]
struct PriceText {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    class: Option<String>,
}

impl OvhClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kimsufi-order/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.signer.is_some()
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| {
            OrderError::InvalidConfigValueError {
                field: "endpoint".to_string(),
                value: self.base_url.clone(),
                reason: e.to_string(),
            }
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.to_string())
    }

    /// Sends one request and returns the raw body of a successful response.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
        need_auth: bool,
    ) -> Result<String> {
        let url = self.url(path, query)?;
        let payload = match body {
            Some(body) => serde_json::to_string(body)?,
            None => String::new(),
        };

        let mut request = self.client.request(method.clone(), &url);
        if body.is_some() {
            request = request
                .header("Content-Type", "application/json")
                .body(payload.clone());
        }

        if need_auth {
            let signer = self.signer.as_ref().ok_or_else(|| OrderError::Forbidden {
                message: format!("{} {} needs an authenticated client", method, path),
            })?;
            let timestamp = Utc::now().timestamp() + signer.time_delta;
            let signature = sign(
                &signer.credentials.application_secret,
                &signer.credentials.consumer_key,
                method.as_str(),
                &url,
                &payload,
                timestamp,
            );
            request = request
                .header("X-Ovh-Application", &signer.credentials.application_key)
                .header("X-Ovh-Consumer", &signer.credentials.consumer_key)
                .header("X-Ovh-Timestamp", timestamp.to_string())
                .header("X-Ovh-Signature", signature);
        }

        tracing::trace!("request: {} {} {}", method, url, payload);
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::trace!("response: {} {}", status, text);

        if status.is_success() {
            Ok(text)
        } else {
            Err(classify_error(status, &text))
        }
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
        need_auth: bool,
    ) -> Result<T> {
        let text = self.send(method, path, query, body, need_auth).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.call::<(), T>(Method::GET, path, query, None, false).await
    }
}

/// `$1$` + hex SHA-1 of the `+`-joined secret, consumer key, method, URL, body and timestamp.
pub fn sign(
    application_secret: &str,
    consumer_key: &str,
    method: &str,
    url: &str,
    body: &str,
    timestamp: i64,
) -> String {
    let mut hasher = Sha1::new();
    hasher.update(
        format!(
            "{}+{}+{}+{}+{}+{}",
            application_secret, consumer_key, method, url, body, timestamp
        )
        .as_bytes(),
    );
    format!("$1${}", hex::encode(hasher.finalize()))
}

/// Maps an error response onto the order error taxonomy.
pub fn classify_error(status: StatusCode, body: &str) -> OrderError {
    let (message, class) = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => (parsed.message, parsed.class),
        Err(_) => (body.trim().to_string(), None),
    };

    match status {
        StatusCode::BAD_REQUEST if message.contains(NOT_AVAILABLE_MARKER) => {
            OrderError::NotAvailable { message }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => OrderError::Forbidden { message },
        _ => OrderError::ApiError {
            status: status.as_u16(),
            class,
            message,
        },
    }
}

#[async_trait]
impl OrderService for OvhClient {
    async fn create_cart(&self, subsidiary: &str, expire: DateTime<Utc>) -> Result<String> {
        let request = CartRequest {
            description: CART_DESCRIPTION,
            expire: expire.to_rfc3339(),
            ovh_subsidiary: subsidiary,
        };
        tracing::debug!("CreateCart request: {:?}", request);

        let response: CartResponse = self
            .call(Method::POST, "/order/cart", &[], Some(&request), false)
            .await?;
        Ok(response.cart_id)
    }

    async fn add_item(
        &self,
        cart_id: &str,
        plan_code: &str,
        quantity: u32,
        price_config: &PriceConfig,
    ) -> Result<u64> {
        let request = EcoItemRequest {
            item_id: None,
            plan_code,
            quantity,
            price_config,
        };
        tracing::debug!("AddEcoItem request: {:?}", request);

        let response: EcoItemResponse = self
            .call(
                Method::POST,
                &format!("/order/cart/{}/eco", cart_id),
                &[],
                Some(&request),
                false,
            )
            .await?;
        Ok(response.item_id)
    }

    async fn get_options(&self, cart_id: &str, plan_code: &str) -> Result<Vec<OptionCandidate>> {
        self.get(
            &format!("/order/cart/{}/eco/options", cart_id),
            &[("planCode", plan_code)],
        )
        .await
    }

    async fn get_price_info(&self, cart_id: &str, plan_code: &str) -> Result<PlanPriceInfo> {
        let infos: Vec<PlanPriceInfo> = self
            .get(&format!("/order/cart/{}/eco", cart_id), &[("planCode", plan_code)])
            .await?;

        Ok(infos
            .into_iter()
            .find(|info| info.plan_code == plan_code)
            .unwrap_or_else(|| PlanPriceInfo {
                plan_code: plan_code.to_string(),
                prices: Vec::new(),
            }))
    }

    async fn get_required_configuration(
        &self,
        cart_id: &str,
        item_id: u64,
    ) -> Result<Vec<ConfigurationField>> {
        self.get(
            &format!("/order/cart/{}/item/{}/requiredConfiguration", cart_id, item_id),
            &[],
        )
        .await
    }

    async fn add_configuration(
        &self,
        cart_id: &str,
        item_id: u64,
        configuration: &ConfigurationRequest,
    ) -> Result<AppliedConfiguration> {
        tracing::debug!("AddItemConfiguration request: {:?}", configuration);
        self.call(
            Method::POST,
            &format!("/order/cart/{}/item/{}/configuration", cart_id, item_id),
            &[],
            Some(configuration),
            false,
        )
        .await
    }

    async fn remove_configuration(
        &self,
        cart_id: &str,
        item_id: u64,
        configuration_id: u64,
    ) -> Result<()> {
        self.send::<()>(
            Method::DELETE,
            &format!(
                "/order/cart/{}/item/{}/configuration/{}",
                cart_id, item_id, configuration_id
            ),
            &[],
            None,
            false,
        )
        .await?;
        Ok(())
    }

    async fn configure_option(
        &self,
        cart_id: &str,
        item_id: u64,
        option: &ItemOption,
        price_config: &PriceConfig,
    ) -> Result<u64> {
        let request = EcoItemRequest {
            item_id: Some(item_id),
            plan_code: &option.plan_code,
            quantity: DEFAULT_QUANTITY,
            price_config,
        };
        tracing::debug!("ConfigureItemOption request: {:?}", request);

        let response: EcoItemResponse = self
            .call(
                Method::POST,
                &format!("/order/cart/{}/eco/options", cart_id),
                &[],
                Some(&request),
                false,
            )
            .await?;
        Ok(response.item_id)
    }

    async fn remove_item(&self, cart_id: &str, item_id: u64) -> Result<()> {
        self.send::<()>(
            Method::DELETE,
            &format!("/order/cart/{}/item/{}", cart_id, item_id),
            &[],
            None,
            false,
        )
        .await?;
        Ok(())
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Self> {
        let server_time: i64 = self.get("/auth/time", &[]).await?;
        let time_delta = server_time - Utc::now().timestamp();
        tracing::debug!("API clock delta: {}s", time_delta);

        Ok(Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            signer: Some(Signer {
                credentials: credentials.clone(),
                time_delta,
            }),
        })
    }

    async fn assign_cart(&self, cart_id: &str) -> Result<()> {
        self.send::<()>(
            Method::POST,
            &format!("/order/cart/{}/assign", cart_id),
            &[],
            None,
            true,
        )
        .await?;
        Ok(())
    }

    async fn checkout(&self, cart_id: &str, auto_pay: bool) -> Result<CheckoutResult> {
        let request = CheckoutRequest {
            auto_pay_with_preferred_payment_method: auto_pay,
            waive_retractation_period: false,
        };
        tracing::debug!("CheckoutCart request: {:?}", request);

        let response: CheckoutResponse = self
            .call(
                Method::POST,
                &format!("/order/cart/{}/checkout", cart_id),
                &[],
                Some(&request),
                true,
            )
            .await?;

        Ok(CheckoutResult {
            order_id: response.order_id.unwrap_or_default(),
            url: response.url.unwrap_or_default(),
            total: response.prices.and_then(|p| p.with_tax).map(|p| p.text),
        })
    }
}
