//! In-process HTTP transport built on reqwest

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use tracing::{debug, warn};

use super::{join_url, ApiRequest, Body, Exchange, Method, Transport};
use crate::error::{TransportError, VerifyResult};

/// Transport reading status and body from separate response fields
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport with the client's default timeouts
    pub fn new(base_url: impl Into<String>) -> VerifyResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pmapi-verify/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<Exchange, TransportError> {
        let url = join_url(&self.base_url, &request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if request.authenticated {
            if let Some(token) = bearer {
                builder = builder.bearer_auth(token);
            }
        }

        if let Some(payload) = &request.payload {
            builder = builder.body(payload.to_string());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();

        // The status is already known; a broken body must not erase it
        let body = match response.text().await {
            Ok(text) => Body::parse(&text),
            Err(e) => {
                warn!("{} body unreadable: {}", request.label(), e);
                Body::TransportError(e.to_string())
            }
        };

        Ok(Exchange::new(status, body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(&self, request: &ApiRequest, bearer: Option<&str>) -> Exchange {
        debug!("http {}", request.label());

        match self.send(request, bearer).await {
            Ok(exchange) => {
                debug!("{} -> {}", request.label(), exchange.status);
                exchange
            }
            Err(e) => {
                warn!("{} failed: {}", request.label(), e);
                Exchange::failed(e.to_string())
            }
        }
    }
}
