//! Scripted transport double for unit tests

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::transport::{ApiRequest, Body, Exchange, Transport};

/// Replays queued exchanges in order and records every request it sees
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Exchange>>,
    calls: Mutex<Vec<(ApiRequest, Option<String>)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: Value) -> Self {
        self.responses
            .lock()
            .push_back(Exchange::new(status, Body::Json(body)));
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().iter().map(|(r, _)| r.clone()).collect()
    }

    pub fn bearers(&self) -> Vec<Option<String>> {
        self.calls.lock().iter().map(|(_, b)| b.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn exchange(&self, request: &ApiRequest, bearer: Option<&str>) -> Exchange {
        let bearer = if request.authenticated {
            bearer.map(str::to_string)
        } else {
            None
        };
        self.calls.lock().push((request.clone(), bearer));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Exchange::failed("no scripted response"))
    }
}
