//! Harness configuration

use std::path::PathBuf;

use crate::error::{VerifyError, VerifyResult};
use crate::transport::TransportKind;

/// API the harness points at unless told otherwise
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";

/// Which scenario groups to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Suite {
    /// Entity approval workflows only
    Approvals,
    /// Single-call checks across the API
    Smoke,
    /// Smoke checks, then approvals
    #[default]
    All,
}

impl Suite {
    pub fn includes_smoke(&self) -> bool {
        matches!(self, Suite::Smoke | Suite::All)
    }

    pub fn includes_approvals(&self) -> bool {
        matches!(self, Suite::Approvals | Suite::All)
    }
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL including the API prefix
    pub base_url: String,

    /// Transport implementation
    pub transport: TransportKind,

    /// curl executable, used by the curl transport only
    pub curl_binary: PathBuf,

    /// Scenario groups to run
    pub suite: Suite,

    /// Prefix for the generated account email
    pub email_prefix: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: TransportKind::default(),
            curl_binary: PathBuf::from("curl"),
            suite: Suite::default(),
            email_prefix: "approver".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Reject base URLs the transports cannot address
    pub fn validate(&self) -> VerifyResult<()> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            VerifyError::InvalidConfig(format!("base URL {:?}: {}", self.base_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(VerifyError::InvalidConfig(format!(
                "base URL must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.email_prefix.trim().is_empty() {
            return Err(VerifyError::InvalidConfig("email prefix is empty".to_string()));
        }

        Ok(())
    }
}
