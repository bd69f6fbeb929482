//! Main runner that sequences auth, smoke checks and approval workflows

use std::time::Instant;

use tracing::{error, info};

use crate::approval::{run_approval, ApprovalEntityType, ApprovalOutcome, ApprovalReport};
use crate::auth::{authenticate, Registration};
use crate::catalog::{default_descriptors, prepare_fixtures};
use crate::check::{Section, Verdict};
use crate::client::ApiClient;
use crate::config::HarnessConfig;
use crate::error::VerifyResult;
use crate::smoke::run_smoke;
use crate::transport::{CurlTransport, HttpTransport, Transport, TransportKind};

/// Receives results as sections complete
pub trait Reporter {
    fn section(&mut self, section: &Section);
    fn summary(&mut self, summary: &SuiteSummary);
}

/// Per-entity result line in the summary
#[derive(Debug, Clone)]
pub struct ApprovalSummary {
    pub entity_type: ApprovalEntityType,
    pub passed: bool,
    pub detail: String,
}

impl From<&ApprovalReport> for ApprovalSummary {
    fn from(report: &ApprovalReport) -> Self {
        let detail = match &report.outcome {
            ApprovalOutcome::Passed { observed } => format!("status {observed}"),
            ApprovalOutcome::Failed(failure) => failure.to_string(),
            ApprovalOutcome::Skipped { reason } => format!("skipped: {reason}"),
        };
        Self {
            entity_type: report.entity_type,
            passed: report.passed(),
            detail,
        }
    }
}

/// Totals for one run
#[derive(Debug, Clone, Default)]
pub struct SuiteSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub approvals: Vec<ApprovalSummary>,
}

impl SuiteSummary {
    fn tally(&mut self, section: &Section) {
        for check in &section.checks {
            match check.verdict {
                Verdict::Pass => self.passed += 1,
                Verdict::Fail => self.failed += 1,
                Verdict::Skip => self.skipped += 1,
            }
        }
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Verification harness bound to one transport
pub struct Harness {
    config: HarnessConfig,
    transport: Box<dyn Transport>,
}

impl Harness {
    /// Validate the configuration and build the configured transport
    pub fn new(config: HarnessConfig) -> VerifyResult<Self> {
        config.validate()?;

        let transport: Box<dyn Transport> = match config.transport {
            TransportKind::Native => Box::new(HttpTransport::new(&config.base_url)?),
            TransportKind::Curl => {
                Box::new(CurlTransport::new(&config.base_url, &config.curl_binary))
            }
        };

        Ok(Self { config, transport })
    }

    /// Use a caller-supplied transport
    pub fn with_transport(config: HarnessConfig, transport: Box<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run the configured suites once, in a fixed order
    pub async fn run(&self, reporter: &mut dyn Reporter) -> SuiteSummary {
        let start = Instant::now();
        let mut summary = SuiteSummary::default();
        let mut emit = |section: Section, summary: &mut SuiteSummary| {
            summary.tally(&section);
            reporter.section(&section);
        };

        info!("Verifying {} ({:?} transport)", self.config.base_url, self.config.transport);

        let registration = Registration::generate(&self.config.email_prefix);
        let auth = authenticate(self.transport.as_ref(), &registration).await;
        let session = auth.session;
        emit(auth.section, &mut summary);

        let client = ApiClient::new(self.transport.as_ref(), &session);

        if self.config.suite.includes_smoke() {
            for section in run_smoke(client).await {
                emit(section, &mut summary);
            }
        }

        if self.config.suite.includes_approvals() {
            let mut setup = Section::new("Approval Fixtures");
            let (check, fixtures) = prepare_fixtures(client).await;
            setup.push(check);
            emit(setup, &mut summary);

            for entry in default_descriptors(session.user_id(), &fixtures) {
                let report = match entry {
                    Ok(descriptor) => run_approval(client, &descriptor).await,
                    Err((entity_type, reason)) => ApprovalReport::skipped(entity_type, reason),
                };

                if let ApprovalOutcome::Failed(failure) = &report.outcome {
                    error!("{} approval failed at {}", report.entity_type, failure);
                }
                summary.approvals.push(ApprovalSummary::from(&report));
                emit(
                    Section {
                        title: format!("Testing {} Approval", report.entity_type),
                        checks: report.checks,
                    },
                    &mut summary,
                );
            }
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Results: {} passed, {} failed, {} skipped ({} ms)",
            summary.passed, summary.failed, summary.skipped, summary.duration_ms
        );

        reporter.summary(&summary);
        summary
    }
}
