//! HTTP seam for the transport.
//!
//! The transport only needs "POST this JSON body, give me status and text".
//! `ReqwestSender` is the production implementation; tests substitute a
//! scripted one.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;

use super::ShopifyError;

/// A prepared GraphQL POST.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: serde_json::Value,
}

/// The parts of an HTTP response the transport inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Parsed `Retry-After` header (seconds), when present.
    pub retry_after: Option<u64>,
    pub body: String,
}

impl HttpResponse {
    /// A 200 response with the given body.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Sends a single HTTP request.
///
/// Implementations report connection-level failures as
/// [`ShopifyError::Network`] or [`ShopifyError::Timeout`] so the transport can
/// retry them. They must not retry on their own.
#[async_trait]
pub trait HttpSend: Send + Sync {
    async fn post(&self, request: &HttpRequest) -> Result<HttpResponse, ShopifyError>;
}

/// `reqwest`-backed sender.
#[derive(Clone, Default)]
pub struct ReqwestSender {
    client: reqwest::Client,
}

impl ReqwestSender {
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestSender {
    async fn post(&self, request: &HttpRequest) -> Result<HttpResponse, ShopifyError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .json(&request.body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        let body = response.text().await.map_err(classify_reqwest_error)?;

        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> ShopifyError {
    if err.is_timeout() {
        // Client-level timeout; duration unknown here.
        ShopifyError::Timeout(std::time::Duration::ZERO)
    } else {
        ShopifyError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::ok("{}").is_success());
        let throttled = HttpResponse {
            status: 429,
            retry_after: Some(2),
            body: String::new(),
        };
        assert!(!throttled.is_success());
    }

    #[test]
    fn test_sender_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestSender>();
    }
}
