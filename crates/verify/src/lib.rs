//! Black-box verification harness for the project-management API
//!
//! The harness talks to a running API over HTTP and checks status codes and
//! response shapes. Its core is a generic approval workflow applied to every
//! approvable entity kind, built on a transport correlator that always
//! yields a paired status code and body.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Harness (runner)                                           │
//! │    ├── authenticate() -> Session        (auth)              │
//! │    ├── run_smoke()    -> [Section]      (smoke)             │
//! │    └── for descriptor in default_descriptors():  (catalog)  │
//! │          run_approval() -> ApprovalReport  (approval)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ApiClient: Transport + &Session, skips calls without token │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Transport::exchange(request, bearer) -> Exchange           │
//! │    ├── HttpTransport  (reqwest, separate status and body)   │
//! │    └── CurlTransport  (curl, `|SEP|` split on last match)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod approval;
pub mod auth;
pub mod catalog;
pub mod check;
pub mod client;
pub mod config;
pub mod error;
pub mod runner;
pub mod session;
pub mod smoke;
pub mod transport;

#[cfg(test)]
mod testing;

pub use approval::{
    run_approval, ApprovalDescriptor, ApprovalEntityType, ApprovalOutcome, ApprovalReport,
};
pub use check::{Check, Detail, Section, Verdict};
pub use client::ApiClient;
pub use config::{HarnessConfig, Suite, DEFAULT_BASE_URL};
pub use error::{VerifyError, VerifyResult};
pub use runner::{Harness, Reporter, SuiteSummary};
pub use session::Session;
pub use transport::{ApiRequest, Body, Exchange, Method, Transport, TransportKind};
