//! Integration tests for the Marigold gateway.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marigold-integration-tests
//! ```
//!
//! Every test starts a [`FakeShopify`] on a loopback port and points the
//! gateway at it through `SHOPIFY_ENDPOINT_OVERRIDE`, so the real reqwest
//! transport, retry loop and cache run end to end without network access.
//!
//! Replies are scripted per GraphQL operation name and consumed in order.
//! An operation with nothing scripted gets a 500.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use marigold_gateway::{Gateway, GatewayConfig};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// A canned response for one request.
#[derive(Debug, Clone)]
pub struct FakeReply {
    status: StatusCode,
    retry_after: Option<u64>,
    body: Value,
    delay: Option<Duration>,
}

impl FakeReply {
    /// `200 { "data": data }`.
    #[must_use]
    pub fn data(data: Value) -> Self {
        Self::body(json!({ "data": data }))
    }

    /// `200` with an arbitrary GraphQL envelope.
    #[must_use]
    pub fn body(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            retry_after: None,
            body,
            delay: None,
        }
    }

    /// A bare HTTP status with a plain error body.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            retry_after: None,
            body: json!({ "errors": "upstream failure" }),
            delay: None,
        }
    }

    /// HTTP 429 with a `Retry-After` header.
    #[must_use]
    pub fn too_many_requests(retry_after: u64) -> Self {
        Self {
            retry_after: Some(retry_after),
            ..Self::status(429)
        }
    }

    /// Hold the response back for `delay`.
    #[must_use]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// A request the fake received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub operation: String,
    pub variables: Value,
    pub admin_token: Option<String>,
}

#[derive(Default)]
struct FakeState {
    replies: Mutex<HashMap<String, VecDeque<FakeReply>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Loopback stand-in for a shop's GraphQL endpoints.
pub struct FakeShopify {
    addr: SocketAddr,
    state: Arc<FakeState>,
    server: JoinHandle<()>,
}

impl FakeShopify {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the loopback listener cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/admin/api/{version}/graphql.json", post(graphql))
            .route("/api/{version}/graphql.json", post(graphql))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake Shopify listener");
        let addr = listener
            .local_addr()
            .expect("Failed to read fake Shopify address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Queue `reply` for the next request running `operation`.
    pub fn reply(&self, operation: &str, reply: FakeReply) {
        self.state
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(operation.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received for `operation`.
    #[must_use]
    pub fn count(&self, operation: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.operation == operation)
            .count()
    }

    /// Environment a configured gateway would be started with.
    #[must_use]
    pub fn env(&self) -> HashMap<String, String> {
        [
            ("SHOPIFY_SHOP_DOMAIN", "fake.myshopify.com".to_string()),
            ("SHOPIFY_ADMIN_ACCESS_TOKEN", "shpat_fake".to_string()),
            ("SHOPIFY_STOREFRONT_ACCESS_TOKEN", "storefront_fake".to_string()),
            ("SHOPIFY_ENDPOINT_OVERRIDE", format!("http://{}", self.addr)),
            ("SHOPIFY_HTTP_TIMEOUT_MS", "300".to_string()),
            ("SHOPIFY_HTTP_RETRIES", "2".to_string()),
            ("SHOPIFY_RETRY_BASE_MS", "10".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// A gateway pointed at this fake with a local-only cache.
    ///
    /// # Panics
    ///
    /// Panics if the generated configuration is rejected.
    #[must_use]
    pub fn gateway(&self) -> Gateway {
        self.gateway_with(&[])
    }

    /// Like [`FakeShopify::gateway`], overriding some variables.
    ///
    /// # Panics
    ///
    /// Panics if the generated configuration is rejected.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn gateway_with(&self, overrides: &[(&str, &str)]) -> Gateway {
        let mut env = self.env();
        for (key, value) in overrides {
            env.insert((*key).to_string(), (*value).to_string());
        }
        let config = GatewayConfig::from_lookup(|key| env.get(key).cloned())
            .expect("Fake gateway configuration should be valid");
        Gateway::connect(config).expect("Local cache should always build")
    }
}

impl Drop for FakeShopify {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn graphql(
    State(state): State<Arc<FakeState>>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let document = body["query"].as_str().unwrap_or_default();
    let operation = operation_name(document);

    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest {
            path: uri.path().to_string(),
            operation: operation.clone(),
            variables: body["variables"].clone(),
            admin_token: headers
                .get("X-Shopify-Access-Token")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });

    let reply = state
        .replies
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_mut(&operation)
        .and_then(VecDeque::pop_front);

    let Some(reply) = reply else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("no reply scripted for {operation}"),
        )
            .into_response();
    };

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let mut response = (reply.status, Json(reply.body)).into_response();
    if let Some(secs) = reply.retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
    response
}

fn operation_name(document: &str) -> String {
    let mut words = document
        .split(|c: char| c.is_whitespace() || c == '(' || c == '{')
        .filter(|w| !w.is_empty());
    match words.next() {
        Some("query" | "mutation") => words.next().unwrap_or("anonymous").to_string(),
        _ => "anonymous".to_string(),
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// An Admin API product node with one variant.
#[must_use]
pub fn product_node(id: u64, title: &str, price: &str, stock: i64) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{id}"),
        "title": title,
        "description": format!("{title} description"),
        "productType": "Apparel",
        "status": "ACTIVE",
        "images": { "edges": [
            { "node": { "id": "gid://shopify/ProductImage/1", "url": format!("https://cdn.example/{id}.png"), "altText": title } }
        ] },
        "variants": { "edges": [
            { "node": { "id": format!("gid://shopify/ProductVariant/{id}0"), "title": "Default", "sku": format!("SKU-{id}"), "price": price, "inventoryQuantity": stock } }
        ] }
    })
}

/// An Admin API order node with one line item.
#[must_use]
pub fn order_node(id: u64, financial: &str, fulfillment: &str) -> Value {
    json!({
        "id": format!("gid://shopify/Order/{id}"),
        "name": format!("#{id}"),
        "email": "buyer@example.com",
        "createdAt": "2024-03-01T12:00:00Z",
        "updatedAt": "2024-03-01T12:30:00Z",
        "tags": ["buyer:user-1"],
        "displayFinancialStatus": financial,
        "displayFulfillmentStatus": fulfillment,
        "subtotalPriceSet": { "shopMoney": { "amount": "40.00", "currencyCode": "EUR" } },
        "totalShippingPriceSet": { "shopMoney": { "amount": "5.00", "currencyCode": "EUR" } },
        "totalTaxSet": { "shopMoney": { "amount": "3.20", "currencyCode": "EUR" } },
        "totalPriceSet": { "shopMoney": { "amount": "48.20", "currencyCode": "EUR" } },
        "customer": { "id": "gid://shopify/Customer/9", "email": "buyer@example.com" },
        "shippingAddress": { "name": "Ada Lovelace", "address1": "1 Loop Rd", "city": "London", "zip": "N1", "country": "GB" },
        "lineItems": { "edges": [
            { "node": {
                "id": "gid://shopify/LineItem/1",
                "title": "Linen Shirt",
                "quantity": 2,
                "originalUnitPriceSet": { "shopMoney": { "amount": "20.00", "currencyCode": "EUR" } },
                "variant": { "id": "gid://shopify/ProductVariant/70", "product": { "id": "gid://shopify/Product/7" } }
            } }
        ] }
    })
}

/// Wrap nodes in a connection.
#[must_use]
pub fn connection(nodes: Vec<Value>) -> Value {
    let edges: Vec<Value> = nodes.into_iter().map(|node| json!({ "node": node })).collect();
    json!({ "edges": edges, "pageInfo": { "hasNextPage": false } })
}
