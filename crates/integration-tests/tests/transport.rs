//! Transport behavior over real HTTP: timeouts, retries, rate limits and
//! error classification.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use marigold_core::ProductFilters;
use marigold_gateway::{ErrorKind, Fetched, Page, ShopifyError};
use marigold_integration_tests::{FakeReply, FakeShopify, product_node};
use serde_json::json;

#[tokio::test]
async fn test_admin_request_carries_token_and_versioned_path() {
    let shop = FakeShopify::start().await;
    shop.reply(
        "Product",
        FakeReply::data(json!({ "product": product_node(1, "Linen Shirt", "19.99", 3) })),
    );

    let fetched = shop.gateway().products().find_one("1").await.unwrap();
    assert!(matches!(fetched, Fetched::Found(_)));

    let requests = shop.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/admin/api/2024-01/graphql.json");
    assert_eq!(requests[0].admin_token.as_deref(), Some("shpat_fake"));
    assert_eq!(requests[0].variables["id"], "gid://shopify/Product/1");
}

#[tokio::test]
async fn test_storefront_client_uses_storefront_path() {
    let shop = FakeShopify::start().await;
    shop.reply("Shop", FakeReply::data(json!({ "shop": { "name": "Marigold" } })));

    let data = shop
        .gateway()
        .storefront()
        .execute("query Shop { shop { name } }", json!({}))
        .await
        .unwrap();
    assert_eq!(data["shop"]["name"], "Marigold");

    let requests = shop.requests();
    assert_eq!(requests[0].path, "/api/2024-01/graphql.json");
    assert_eq!(requests[0].admin_token, None);
}

#[tokio::test]
async fn test_unconfigured_gateway_sends_nothing() {
    let shop = FakeShopify::start().await;
    let gateway = shop.gateway_with(&[("SHOPIFY_ADMIN_ACCESS_TOKEN", "  ")]);

    let page = gateway
        .products()
        .find_all(1, 20, &ProductFilters::default())
        .await
        .unwrap();
    assert_eq!(page, Page::NotConfigured);
    assert_eq!(gateway.orders().find_one("1").await.unwrap(), Fetched::NotConfigured);

    let err = gateway.products().delete("1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(shop.requests().is_empty());
}

#[tokio::test]
async fn test_slow_response_is_retried_then_succeeds() {
    let shop = FakeShopify::start().await;
    shop.reply(
        "Product",
        FakeReply::data(json!({ "product": null })).delayed(Duration::from_secs(2)),
    );
    shop.reply(
        "Product",
        FakeReply::data(json!({ "product": product_node(2, "Wool Hat", "25.00", 1) })),
    );

    let product = shop
        .gateway()
        .products()
        .find_one("2")
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(product.name, "Wool Hat");
    assert_eq!(shop.count("Product"), 2);
}

#[tokio::test]
async fn test_timeouts_exhaust_retries() {
    let shop = FakeShopify::start().await;
    for _ in 0..3 {
        shop.reply(
            "Product",
            FakeReply::data(json!({ "product": null })).delayed(Duration::from_secs(2)),
        );
    }

    let err = shop.gateway().products().find_one("3").await.unwrap_err();
    assert!(matches!(err, ShopifyError::Timeout(d) if d == Duration::from_millis(300)));
    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(shop.count("Product"), 3);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let shop = FakeShopify::start().await;
    shop.reply("Product", FakeReply::status(502));

    let err = shop.gateway().products().find_one("4").await.unwrap_err();
    assert!(matches!(err, ShopifyError::Http { status: 502, .. }));
    assert_eq!(shop.count("Product"), 1);
}

#[tokio::test]
async fn test_http_429_reports_retry_after() {
    let shop = FakeShopify::start().await;
    shop.reply("Orders", FakeReply::too_many_requests(7));

    let err = shop
        .gateway()
        .orders()
        .find_all(1, 10, &marigold_core::OrderFilters::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit);
    assert_eq!(err.retry_after(), Some(7));
    assert_eq!(shop.count("Orders"), 1);
}

#[tokio::test]
async fn test_throttled_graphql_error_is_rate_limit() {
    let shop = FakeShopify::start().await;
    shop.reply(
        "Product",
        FakeReply::body(json!({
            "errors": [{ "message": "Throttled", "extensions": { "code": "THROTTLED" } }],
            "extensions": { "cost": {
                "requestedQueryCost": 52,
                "actualQueryCost": null,
                "throttleStatus": { "maximumAvailable": 1000.0, "currentlyAvailable": 2.0, "restoreRate": 50.0 }
            } }
        })),
    );

    let err = shop.gateway().products().find_one("5").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit);
    assert_eq!(err.retry_after(), Some(20));
}

#[tokio::test]
async fn test_graphql_errors_surface_as_api_errors() {
    let shop = FakeShopify::start().await;
    shop.reply(
        "Product",
        FakeReply::body(json!({
            "errors": [{ "message": "Access denied", "extensions": { "code": "ACCESS_DENIED" } }]
        })),
    );

    let err = shop.gateway().products().find_one("6").await.unwrap_err();
    let ShopifyError::GraphQL(errors) = &err else {
        panic!("expected GraphQL error, got {err:?}");
    };
    assert_eq!(errors[0].code.as_deref(), Some("ACCESS_DENIED"));
    assert_eq!(err.kind(), ErrorKind::Api);
}
