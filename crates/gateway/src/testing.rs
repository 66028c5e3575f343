//! Test doubles shared by unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::time::Instant;

use crate::config::{HttpConfig, ShopifyConfig};
use crate::shopify::{HttpRequest, HttpResponse, HttpSend, ShopifyError};

/// What the scripted sender does for one request.
pub enum Reply {
    Raw(HttpResponse),
    Timeout,
    Network,
    /// Never completes; only the transport timeout ends it.
    Hang,
}

impl Reply {
    /// A 200 response with `{"data": data}`.
    pub fn data(data: Value) -> Self {
        Self::body(json!({ "data": data }))
    }

    /// A 200 response with an arbitrary JSON body.
    pub fn body(body: Value) -> Self {
        Self::Raw(HttpResponse::ok(body.to_string()))
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self::Raw(HttpResponse {
            status,
            retry_after: None,
            body: body.to_string(),
        })
    }
}

/// `HttpSend` that answers from a fixed script and records every request.
pub struct ScriptedSender {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    times: Mutex<Vec<Instant>>,
}

impl ScriptedSender {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            times: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `variables` of the n-th request.
    pub fn variables(&self, n: usize) -> Value {
        self.requests()[n].body["variables"].clone()
    }

    /// `query` of the n-th request.
    pub fn document(&self, n: usize) -> String {
        self.requests()[n].body["query"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.times.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpSend for ScriptedSender {
    async fn post(&self, request: &HttpRequest) -> Result<HttpResponse, ShopifyError> {
        self.requests.lock().unwrap().push(request.clone());
        self.times.lock().unwrap().push(Instant::now());
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            Some(Reply::Raw(response)) => Ok(response),
            Some(Reply::Timeout) => Err(ShopifyError::Timeout(Duration::ZERO)),
            Some(Reply::Network) => Err(ShopifyError::Network("connection reset".to_string())),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(ShopifyError::Network("no scripted reply left".to_string())),
        }
    }
}

pub fn configured_shopify() -> ShopifyConfig {
    ShopifyConfig {
        shop_domain: Some("demo.myshopify.com".to_string()),
        admin_access_token: Some(SecretString::from("shpat_test".to_string())),
        storefront_access_token: Some(SecretString::from("storefront_test".to_string())),
        ..ShopifyConfig::default()
    }
}

/// No retries and a short timeout, for tests that are not about retrying.
pub fn fast_http() -> HttpConfig {
    HttpConfig {
        timeout: Duration::from_secs(1),
        retries: 0,
        retry_base_delay: Duration::from_millis(1),
        retry_factor: 2,
    }
}
