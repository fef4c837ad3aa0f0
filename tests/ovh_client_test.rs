use anyhow::Result;
use chrono::Utc;
use httpmock::prelude::*;
use kimsufi_order::domain::model::{
    ConfigurationRequest, Credentials, DatacenterSelection, ItemOption, PriceConfig, LOCATION_LABEL,
};
use kimsufi_order::{
    ConsolePrompt, OrderError, OrderOrchestrator, OrderOutcome, OrderRequest, OrderService,
    OvhClient,
};
use serde_json::json;
use std::time::Duration;

fn client(server: &MockServer) -> OvhClient {
    OvhClient::new(server.url("/1.0"), Duration::from_secs(5)).unwrap()
}

fn credentials() -> Credentials {
    Credentials {
        application_key: "app-key".to_string(),
        application_secret: "app-secret".to_string(),
        consumer_key: "consumer-key".to_string(),
    }
}

fn mock_auth_time(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/1.0/auth/time");
        then.status(200).body(Utc::now().timestamp().to_string());
    })
}

#[tokio::test]
async fn test_create_cart_and_add_item() -> Result<()> {
    let server = MockServer::start();
    let cart_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/1.0/order/cart")
            .json_body_partial(r#"{"description":"kimsufi-order","ovhSubsidiary":"FR"}"#);
        then.status(200).json_body(json!({"cartId": "abc", "readOnly": false, "items": []}));
    });
    let item_mock = server.mock(|when, then| {
        when.method(POST).path("/1.0/order/cart/abc/eco").json_body(json!({
            "planCode": "24ska01",
            "quantity": 1,
            "duration": "P1M",
            "pricingMode": "default"
        }));
        then.status(200).json_body(json!({"itemId": 42, "cartId": "abc"}));
    });

    let client = client(&server);
    let cart_id = client
        .create_cart("FR", Utc::now() + chrono::Duration::hours(1))
        .await?;
    let item_id = client
        .add_item(&cart_id, "24ska01", 1, &PriceConfig::default())
        .await?;

    assert_eq!(cart_id, "abc");
    assert_eq!(item_id, 42);
    cart_mock.assert();
    item_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_catalog_queries() -> Result<()> {
    let server = MockServer::start();
    let price_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/1.0/order/cart/abc/eco")
            .query_param("planCode", "24ska01");
        then.status(200).json_body(json!([
            {"planCode": "24ska02", "prices": []},
            {"planCode": "24ska01", "productName": "KS-A", "prices": [
                {"duration": "P1M", "pricingMode": "default", "pricingType": "rental",
                 "interval": 1, "capacities": ["installation", "renew"],
                 "priceInUcents": 1_099_000_000u64}
            ]}
        ]));
    });
    let options_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/1.0/order/cart/abc/eco/options")
            .query_param("planCode", "24ska01");
        then.status(200).json_body(json!([
            {"family": "memory", "planCode": "ram-32g-24ska01", "mandatory": true, "prices": []},
            {"family": "bandwidth", "planCode": "bandwidth-100-24ska01", "mandatory": false,
             "prices": []}
        ]));
    });
    let fields_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/1.0/order/cart/abc/item/42/requiredConfiguration");
        then.status(200).json_body(json!([
            {"label": "dedicated_datacenter", "required": true, "type": "string",
             "allowedValues": ["gra", "rbx"], "fields": null},
            {"label": "dedicated_os", "required": true, "type": "string",
             "allowedValues": ["none_64.en"]}
        ]));
    });

    let client = client(&server);
    let price_info = client.get_price_info("abc", "24ska01").await?;
    let options = client.get_options("abc", "24ska01").await?;
    let fields = client.get_required_configuration("abc", 42).await?;

    assert_eq!(price_info.plan_code, "24ska01");
    assert_eq!(price_info.prices.len(), 1);
    assert_eq!(price_info.prices[0].interval, 1);
    assert_eq!(options.len(), 2);
    assert!(options[0].mandatory);
    assert_eq!(options[1].option, ItemOption::new("bandwidth", "bandwidth-100-24ska01"));
    assert_eq!(fields[0].label, LOCATION_LABEL);
    assert_eq!(fields[0].allowed_values, vec!["gra", "rbx"]);
    price_mock.assert();
    options_mock.assert();
    fields_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_missing_plan_price_info_is_empty() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/1.0/order/cart/abc/eco");
        then.status(200).json_body(json!([]));
    });

    let price_info = client(&server).get_price_info("abc", "24ska01").await?;

    assert_eq!(price_info.plan_code, "24ska01");
    assert!(price_info.prices.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_configuration_add_and_remove() -> Result<()> {
    let server = MockServer::start();
    let add_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/1.0/order/cart/abc/item/42/configuration")
            .json_body(json!({"label": "dedicated_datacenter", "value": "gra"}));
        then.status(200)
            .json_body(json!({"id": 7, "label": "dedicated_datacenter", "value": "gra"}));
    });
    let remove_mock = server.mock(|when, then| {
        when.method(DELETE)
            .path("/1.0/order/cart/abc/item/42/configuration/7");
        then.status(200).body("null");
    });
    let option_mock = server.mock(|when, then| {
        when.method(POST).path("/1.0/order/cart/abc/eco/options").json_body(json!({
            "itemId": 42,
            "planCode": "ram-32g-24ska01",
            "quantity": 1,
            "duration": "P1M",
            "pricingMode": "default"
        }));
        then.status(200).json_body(json!({"itemId": 43}));
    });
    let remove_option_mock = server.mock(|when, then| {
        when.method(DELETE).path("/1.0/order/cart/abc/item/43");
        then.status(200).body("null");
    });

    let client = client(&server);
    let applied = client
        .add_configuration("abc", 42, &ConfigurationRequest::new(LOCATION_LABEL, "gra"))
        .await?;
    client.remove_configuration("abc", 42, applied.id).await?;
    let option_item = client
        .configure_option(
            "abc",
            42,
            &ItemOption::new("memory", "ram-32g-24ska01"),
            &PriceConfig::default(),
        )
        .await?;
    client.remove_item("abc", option_item).await?;

    assert_eq!(applied.id, 7);
    assert_eq!(option_item, 43);
    assert_eq!(applied.request.value, "gra");
    add_mock.assert();
    remove_mock.assert();
    option_mock.assert();
    remove_option_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_signed_assign_and_checkout() -> Result<()> {
    let server = MockServer::start();
    let time_mock = mock_auth_time(&server);
    let assign_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/1.0/order/cart/abc/assign")
            .header("x-ovh-application", "app-key")
            .header("x-ovh-consumer", "consumer-key")
            .header_exists("x-ovh-timestamp")
            .header_exists("x-ovh-signature");
        then.status(200).body("null");
    });
    let checkout_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/1.0/order/cart/abc/checkout")
            .header("x-ovh-application", "app-key")
            .header_exists("x-ovh-signature")
            .json_body(json!({
                "autoPayWithPreferredPaymentMethod": true,
                "waiveRetractationPeriod": false
            }));
        then.status(200).json_body(json!({
            "orderId": 123456,
            "url": "https://www.ovh.com/cgi-bin/order/display-order.cgi?orderId=123456",
            "prices": {"withTax": {"text": "12.99 €", "value": 12.99}}
        }));
    });

    let account = client(&server).authenticate(&credentials()).await?;
    account.assign_cart("abc").await?;
    let result = account.checkout("abc", true).await?;

    assert!(account.is_authenticated());
    assert_eq!(result.order_id, 123456);
    assert!(result.url.contains("123456"));
    assert_eq!(result.total.as_deref(), Some("12.99 €"));
    time_mock.assert();
    assign_mock.assert();
    checkout_mock.assert();
    Ok(())
}

#[tokio::test]
async fn test_unauthenticated_checkout_is_forbidden_locally() {
    let server = MockServer::start();
    let checkout_mock = server.mock(|when, then| {
        when.method(POST).path("/1.0/order/cart/abc/checkout");
        then.status(200).json_body(json!({"orderId": 1}));
    });

    let err = client(&server).checkout("abc", false).await.unwrap_err();

    assert!(err.is_forbidden());
    checkout_mock.assert_hits(0);
}

#[tokio::test]
async fn test_error_classification() -> Result<()> {
    let server = MockServer::start();
    mock_auth_time(&server);
    server.mock(|when, then| {
        when.method(POST).path("/1.0/order/cart/unavailable/checkout");
        then.status(400).json_body(json!({
            "class": "Client::BadRequest",
            "message": "Item 24ska01 is not available in gra"
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/1.0/order/cart/denied/checkout");
        then.status(403).json_body(json!({
            "class": "Client::Forbidden",
            "message": "This call has not been granted"
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/1.0/order/cart/broken/checkout");
        then.status(500).body("Internal Server Error");
    });

    let account = client(&server).authenticate(&credentials()).await?;

    let err = account.checkout("unavailable", false).await.unwrap_err();
    assert!(err.is_not_available());

    let err = account.checkout("denied", false).await.unwrap_err();
    assert!(matches!(err, OrderError::Forbidden { ref message } if message.contains("granted")));

    let err = account.checkout("broken", false).await.unwrap_err();
    assert!(matches!(err, OrderError::ApiError { status: 500, class: None, .. }));
    Ok(())
}

#[tokio::test]
async fn test_full_run_exhausts_against_api() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/1.0/order/cart");
        then.status(200).json_body(json!({"cartId": "abc"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/1.0/order/cart/abc/eco");
        then.status(200).json_body(json!([]));
    });
    server.mock(|when, then| {
        when.method(POST).path("/1.0/order/cart/abc/eco");
        then.status(200).json_body(json!({"itemId": 42}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/1.0/order/cart/abc/item/42/requiredConfiguration");
        then.status(200).json_body(json!([
            {"label": "dedicated_datacenter", "required": true,
             "allowedValues": ["gra", "rbx", "sbg"]},
            {"label": "region", "required": true, "allowedValues": ["europe"]}
        ]));
    });
    let region_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/1.0/order/cart/abc/item/42/configuration")
            .json_body(json!({"label": "region", "value": "europe"}));
        then.status(200).json_body(json!({"id": 1, "label": "region", "value": "europe"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/1.0/order/cart/abc/eco/options");
        then.status(200).json_body(json!([]));
    });
    mock_auth_time(&server);
    let assign_mock = server.mock(|when, then| {
        when.method(POST).path("/1.0/order/cart/abc/assign");
        then.status(200).body("null");
    });
    let mut location_mocks = Vec::new();
    let mut removal_mocks = Vec::new();
    for (id, datacenter) in [(10, "gra"), (11, "rbx")] {
        location_mocks.push(server.mock(|when, then| {
            when.method(POST)
                .path("/1.0/order/cart/abc/item/42/configuration")
                .json_body(json!({"label": "dedicated_datacenter", "value": datacenter}));
            then.status(200)
                .json_body(json!({"id": id, "label": "dedicated_datacenter", "value": datacenter}));
        }));
        removal_mocks.push(server.mock(|when, then| {
            when.method(DELETE)
                .path(format!("/1.0/order/cart/abc/item/42/configuration/{}", id));
            then.status(200).body("null");
        }));
    }
    let checkout_mock = server.mock(|when, then| {
        when.method(POST).path("/1.0/order/cart/abc/checkout");
        then.status(400)
            .json_body(json!({"message": "Item 24ska01 is not available in this datacenter"}));
    });

    let mut request = OrderRequest::new("24ska01", "FR");
    request.datacenters = DatacenterSelection::Listed(vec!["gra".to_string(), "rbx".to_string()]);
    request.default_configurations = vec![ConfigurationRequest::new("region", "europe")];
    request.credentials = Some(credentials());

    let prompt = ConsolePrompt::new(&b""[..], Vec::new());
    let mut orchestrator = OrderOrchestrator::new(client(&server), prompt);
    let outcome = orchestrator.run(&request).await?;

    assert_eq!(outcome, OrderOutcome::Exhausted { attempts: 2 });
    region_mock.assert();
    assign_mock.assert();
    checkout_mock.assert_hits(2);
    for mock in location_mocks.iter().chain(removal_mocks.iter()) {
        mock.assert();
    }
    Ok(())
}
