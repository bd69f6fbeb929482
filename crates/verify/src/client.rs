//! Session-aware wrapper around a transport

use tracing::debug;

use crate::check::Check;
use crate::session::Session;
use crate::transport::{ApiRequest, Exchange, Transport};

/// Reason recorded when an authenticated call is skipped
pub const NO_TOKEN: &str = "no session token";

/// Pairs a transport with the read-only session of the current run
#[derive(Clone, Copy)]
pub struct ApiClient<'a> {
    transport: &'a dyn Transport,
    session: &'a Session,
}

impl<'a> ApiClient<'a> {
    pub fn new(transport: &'a dyn Transport, session: &'a Session) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &'a Session {
        self.session
    }

    /// Send the request, or return `None` when it needs a token the session
    /// does not have. Such requests are never put on the wire.
    pub async fn send(&self, request: &ApiRequest) -> Option<Exchange> {
        if request.authenticated && !self.session.is_authenticated() {
            debug!("skipping {}: {}", request.label(), NO_TOKEN);
            return None;
        }
        Some(self.transport.exchange(request, self.session.bearer()).await)
    }

    /// Send and record a status check. The exchange is returned only when
    /// the status matched.
    pub async fn expect(
        &self,
        name: impl Into<String>,
        request: &ApiRequest,
        expected: &[u16],
    ) -> (Check, Option<Exchange>) {
        let name = name.into();
        match self.send(request).await {
            None => (Check::skipped(name, NO_TOKEN), None),
            Some(exchange) => {
                let check = Check::status(name, &exchange, expected);
                let exchange = check.passed().then_some(exchange);
                (check, exchange)
            }
        }
    }
}
