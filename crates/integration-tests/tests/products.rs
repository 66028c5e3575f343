//! Product operations end to end: listing windows, cache-aside reads and
//! write invalidation.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::str::FromStr;

use marigold_core::{ProductFilters, ProductInput, ProductStatus};
use marigold_gateway::{ErrorKind, ShopifyError};
use marigold_integration_tests::{FakeReply, FakeShopify, connection, product_node};
use rust_decimal::Decimal;
use serde_json::json;

fn catalog(count: u64) -> serde_json::Value {
    let nodes = (1..=count)
        .map(|n| product_node(n, &format!("Product {n}"), "10.00", 5))
        .collect();
    json!({ "products": connection(nodes) })
}

#[tokio::test]
async fn test_list_windows_and_caches_per_filter() {
    let shop = FakeShopify::start().await;
    shop.reply("Products", FakeReply::data(catalog(6)));
    shop.reply("Products", FakeReply::data(catalog(2)));
    let gateway = shop.gateway();
    let products = gateway.products();

    let page = products
        .find_all(2, 3, &ProductFilters::default())
        .await
        .unwrap()
        .into_items();
    let names: Vec<&str> = page.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Product 4", "Product 5", "Product 6"]);

    // Same key: served from cache
    let again = products
        .find_all(2, 3, &ProductFilters::default())
        .await
        .unwrap()
        .into_items();
    assert_eq!(again, page);
    assert_eq!(shop.count("Products"), 1);

    // Different filters: new key, new request
    let active = ProductFilters {
        status: Some(ProductStatus::Active),
        category: Some("Apparel".to_string()),
        search: None,
    };
    products.find_all(1, 3, &active).await.unwrap();
    assert_eq!(shop.count("Products"), 2);

    let requests = shop.requests();
    assert_eq!(requests[0].variables["first"], 6);
    assert_eq!(
        requests[1].variables["query"],
        "product_type:\"Apparel\" status:active"
    );
}

#[tokio::test]
async fn test_find_one_maps_the_platform_node() {
    let shop = FakeShopify::start().await;
    shop.reply(
        "Product",
        FakeReply::data(json!({ "product": product_node(8, "Linen Shirt", "19.99", 12) })),
    );
    let gateway = shop.gateway();

    let product = gateway
        .products()
        .find_one("8")
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(product.id, "gid://shopify/Product/8");
    assert_eq!(product.price, Decimal::from_str("19.99").unwrap());
    assert_eq!(product.stock, 12);
    assert_eq!(product.category, "Apparel");
    assert_eq!(product.image, "https://cdn.example/8.png");
    assert_eq!(product.status, ProductStatus::Active);
    assert_eq!(product.variants[0].sku.as_deref(), Some("SKU-8"));

    // Global id hits the same cache entry
    gateway
        .products()
        .find_one("gid://shopify/Product/8")
        .await
        .unwrap();
    assert_eq!(shop.count("Product"), 1);
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let shop = FakeShopify::start().await;
    shop.reply("Product", FakeReply::data(json!({ "product": null })));

    let err = shop
        .gateway()
        .products()
        .find_one("404")
        .await
        .unwrap()
        .into_result()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Product not found: gid://shopify/Product/404");
}

#[tokio::test]
async fn test_create_invalidates_listings() {
    let shop = FakeShopify::start().await;
    shop.reply("Products", FakeReply::data(catalog(1)));
    shop.reply(
        "ProductCreate",
        FakeReply::data(json!({ "productCreate": {
            "product": product_node(2, "Silk Scarf", "45.00", 0),
            "userErrors": []
        } })),
    );
    shop.reply("Products", FakeReply::data(catalog(2)));
    let gateway = shop.gateway();
    let filters = ProductFilters::default();

    assert_eq!(gateway.products().find_all(1, 20, &filters).await.unwrap().into_items().len(), 1);

    let input = ProductInput {
        name: Some("Silk Scarf".to_string()),
        price: Some(Decimal::from_str("45.00").unwrap()),
        tags: Some(vec!["accessories".to_string()]),
        ..ProductInput::default()
    };
    let created = gateway.products().create(&input).await.unwrap();
    assert_eq!(created.id, "gid://shopify/Product/2");

    let requests = shop.requests();
    let create_vars = &requests[1].variables["input"];
    assert_eq!(create_vars["title"], "Silk Scarf");
    assert_eq!(create_vars["variants"][0]["price"], "45.00");

    assert_eq!(gateway.products().find_all(1, 20, &filters).await.unwrap().into_items().len(), 2);
    assert_eq!(shop.count("Products"), 2);
}

#[tokio::test]
async fn test_create_surfaces_user_errors() {
    let shop = FakeShopify::start().await;
    shop.reply(
        "ProductCreate",
        FakeReply::data(json!({ "productCreate": {
            "product": null,
            "userErrors": [{ "field": ["title"], "message": "has already been taken" }]
        } })),
    );

    let input = ProductInput {
        name: Some("Duplicate".to_string()),
        ..ProductInput::default()
    };
    let err = shop.gateway().products().create(&input).await.unwrap_err();
    assert!(matches!(&err, ShopifyError::UserError(msg) if msg == "title: has already been taken"));
}

#[tokio::test]
async fn test_invalid_input_never_reaches_the_platform() {
    let shop = FakeShopify::start().await;
    let gateway = shop.gateway();

    let err = gateway.products().create(&ProductInput::default()).await.unwrap_err();
    assert!(matches!(err, ShopifyError::InvalidInput(_)));

    let err = gateway
        .products()
        .update("1", &ProductInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ShopifyError::InvalidInput(_)));
    assert!(shop.requests().is_empty());
}

#[tokio::test]
async fn test_update_price_goes_through_first_variant() {
    let shop = FakeShopify::start().await;
    shop.reply(
        "Product",
        FakeReply::data(json!({ "product": product_node(3, "Cap", "15.00", 4) })),
    );
    shop.reply(
        "ProductUpdate",
        FakeReply::data(json!({ "productUpdate": {
            "product": product_node(3, "Cap", "15.00", 4),
            "userErrors": []
        } })),
    );
    shop.reply(
        "VariantPriceUpdate",
        FakeReply::data(json!({ "productVariantsBulkUpdate": { "userErrors": [] } })),
    );
    shop.reply(
        "Product",
        FakeReply::data(json!({ "product": product_node(3, "Cap", "18.50", 4) })),
    );
    let gateway = shop.gateway();

    gateway.products().find_one("3").await.unwrap();

    let input = ProductInput {
        price: Some(Decimal::from_str("18.50").unwrap()),
        ..ProductInput::default()
    };
    let updated = gateway.products().update("3", &input).await.unwrap();
    assert_eq!(updated.price, Decimal::from_str("18.50").unwrap());

    let price_vars = shop
        .requests()
        .into_iter()
        .find(|r| r.operation == "VariantPriceUpdate")
        .unwrap()
        .variables;
    assert_eq!(price_vars["productId"], "gid://shopify/Product/3");
    assert_eq!(price_vars["variants"][0]["id"], "gid://shopify/ProductVariant/30");
    assert_eq!(price_vars["variants"][0]["price"], "18.50");

    // The cached item was dropped, so the next read refetches
    let fresh = gateway
        .products()
        .find_one("3")
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(fresh.price, Decimal::from_str("18.50").unwrap());
    assert_eq!(shop.count("Product"), 2);
}

#[tokio::test]
async fn test_delete_confirms_and_reports_missing() {
    let shop = FakeShopify::start().await;
    shop.reply(
        "ProductDelete",
        FakeReply::data(json!({ "productDelete": {
            "deletedProductId": "gid://shopify/Product/5",
            "userErrors": []
        } })),
    );
    shop.reply(
        "ProductDelete",
        FakeReply::data(json!({ "productDelete": { "deletedProductId": null, "userErrors": [] } })),
    );
    let gateway = shop.gateway();

    let confirmation = gateway.products().delete("5").await.unwrap();
    assert_eq!(confirmation.id, "gid://shopify/Product/5");
    assert_eq!(
        shop.requests()[0].variables["input"]["id"],
        "gid://shopify/Product/5"
    );

    let err = gateway.products().delete("5").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
