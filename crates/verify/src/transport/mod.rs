//! Transport correlator - one HTTP call in, one (status, body) pair out
//!
//! Every implementation of [`Transport`] is infallible from the caller's
//! point of view: launch failures, network errors and unparseable bodies all
//! come back as an [`Exchange`] with status 0 and a tagged body.

mod curl;
mod http;

pub use curl::{split_combined_output, CurlTransport, SENTINEL};
pub use http::HttpTransport;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

/// HTTP verbs the harness issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request against the API, relative to the base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub payload: Option<Value>,
    /// Attach the session token as a bearer credential
    pub authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload: None,
            authenticated: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::Post, path).with_payload(payload)
    }

    pub fn patch(path: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::Patch, path).with_payload(payload)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Send without credentials (registration, login, health)
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Label used in logs and check names, e.g. `POST /projects`
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Response body as recovered by a transport
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Nothing came back
    Empty,
    /// Parsed JSON document
    Json(Value),
    /// Body that was not valid JSON, kept verbatim for diagnostics
    Raw(String),
    /// The call never produced a response
    TransportError(String),
}

impl Body {
    /// Parse response text: blank is `Empty`, invalid JSON is `Raw`
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Body::Empty;
        }
        match serde_json::from_str(text) {
            Ok(value) => Body::Json(value),
            Err(_) => Body::Raw(text.to_string()),
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The `data` envelope field
    pub fn data(&self) -> Option<&Value> {
        self.json().and_then(|v| v.get("data"))
    }

    /// The `meta` envelope field (pagination)
    pub fn meta(&self) -> Option<&Value> {
        self.json().and_then(|v| v.get("meta"))
    }

    /// A string field of the `data` object
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data().and_then(|d| d.get(key)).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Render for failure diagnostics
    pub fn pretty(&self) -> String {
        match self {
            Body::Empty => "{}".to_string(),
            Body::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Body::Raw(text) => {
                serde_json::to_string_pretty(&serde_json::json!({ "raw": text }))
                    .unwrap_or_else(|_| text.clone())
            }
            Body::TransportError(message) => {
                serde_json::to_string_pretty(&serde_json::json!({ "error": message }))
                    .unwrap_or_else(|_| message.clone())
            }
        }
    }
}

/// Paired status code and body of one HTTP call
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// HTTP status, 0 when unknown
    pub status: u16,
    pub body: Body,
}

impl Exchange {
    pub fn new(status: u16, body: Body) -> Self {
        Self { status, body }
    }

    /// Pair for a call that failed before any response arrived
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            body: Body::TransportError(message.into()),
        }
    }
}

/// Issues one HTTP call and always returns a paired result
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform exactly one attempt. `bearer` is attached only when the
    /// request is marked authenticated.
    async fn exchange(&self, request: &ApiRequest, bearer: Option<&str>) -> Exchange;
}

/// Which transport implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// In-process HTTP client, status and body on separate channels
    #[default]
    Native,
    /// External `curl` process with a combined output stream
    Curl,
}

/// Join a base URL and an endpoint path without doubling slashes
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
