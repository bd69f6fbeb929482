//! Generic entity-approval workflow driver
//!
//! One procedure validates every approvable entity kind:
//!
//! ```text
//! Created ──► ApprovalFiled ──► Resolved ──► Verified
//!  POST         POST               PATCH        GET
//!  {endpoint}   /approval-requests /…/{id}/status {endpoint}/{id}
//! ```
//!
//! Each stage needs the handle produced by the one before it, so the first
//! failure ends the run for that descriptor. Failures are reported in the
//! returned [`ApprovalReport`], never raised.

use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::check::{Check, Detail};
use crate::client::{ApiClient, NO_TOKEN};
use crate::transport::{ApiRequest, Exchange};

/// Endpoint that files and resolves approval requests
pub const APPROVAL_REQUESTS: &str = "/approval-requests";

/// Approval status sent in the resolve step
pub const APPROVED: &str = "approved";

/// Entity kinds the approval subsystem accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalEntityType {
    Invoice,
    ProjectDeliverable,
    File,
    Task,
}

impl ApprovalEntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalEntityType::Invoice => "invoice",
            ApprovalEntityType::ProjectDeliverable => "project_deliverable",
            ApprovalEntityType::File => "file",
            ApprovalEntityType::Task => "task",
        }
    }
}

impl fmt::Display for ApprovalEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the approval table
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalDescriptor {
    pub entity_type: ApprovalEntityType,
    /// Collection endpoint; the entity is re-fetched at `{create_endpoint}/{id}`
    pub create_endpoint: String,
    pub payload: Value,
    /// Entity status the API must report once the approval is granted
    pub expected_status: String,
}

impl ApprovalDescriptor {
    pub fn new(
        entity_type: ApprovalEntityType,
        create_endpoint: impl Into<String>,
        payload: Value,
        expected_status: impl Into<String>,
    ) -> Self {
        Self {
            entity_type,
            create_endpoint: create_endpoint.into(),
            payload,
            expected_status: expected_status.into(),
        }
    }
}

/// Identifier of a resource created during this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityHandle(String);

impl EntityHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Read `data._id` from a creation response
    pub fn from_exchange(exchange: &Exchange) -> Option<Self> {
        exchange
            .body
            .data_str("_id")
            .filter(|id| !id.is_empty())
            .map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStage {
    Created,
    ApprovalFiled,
    Resolved,
    Verified,
}

impl fmt::Display for ApprovalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApprovalStage::Created => "created",
            ApprovalStage::ApprovalFiled => "approval filed",
            ApprovalStage::Resolved => "resolved",
            ApprovalStage::Verified => "verified",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    UnexpectedStatus { expected: u16, actual: u16 },
    MissingHandle,
    StatusMismatch {
        expected: String,
        observed: Option<String>,
    },
}

/// Where and why a workflow stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub stage: ApprovalStage,
    pub kind: FailureKind,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FailureKind::UnexpectedStatus { expected, actual } => {
                write!(f, "{}: expected HTTP {}, got {}", self.stage, expected, actual)
            }
            FailureKind::MissingHandle => write!(f, "{}: response carried no _id", self.stage),
            FailureKind::StatusMismatch { expected, observed } => write!(
                f,
                "{}: status is {}, expected {}",
                self.stage,
                observed.as_deref().unwrap_or("<missing>"),
                expected
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Passed { observed: String },
    Failed(StepFailure),
    Skipped { reason: String },
}

/// Result of one descriptor run
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalReport {
    pub entity_type: ApprovalEntityType,
    pub checks: Vec<Check>,
    pub outcome: ApprovalOutcome,
}

impl ApprovalReport {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, ApprovalOutcome::Passed { .. })
    }

    /// Report for a descriptor that was never attempted
    pub(crate) fn skipped(entity_type: ApprovalEntityType, reason: &str) -> Self {
        Self {
            entity_type,
            checks: vec![Check::skipped(format!("{entity_type} approval"), reason)],
            outcome: ApprovalOutcome::Skipped {
                reason: reason.to_string(),
            },
        }
    }
}

/// Run create → file → resolve → verify for one descriptor
pub async fn run_approval(
    client: ApiClient<'_>,
    descriptor: &ApprovalDescriptor,
) -> ApprovalReport {
    let entity_type = descriptor.entity_type;
    let session = client.session();

    if !session.is_authenticated() {
        return ApprovalReport::skipped(entity_type, NO_TOKEN);
    }
    let Some(approver) = session.user_id() else {
        return ApprovalReport::skipped(entity_type, "no user id in session");
    };

    info!("Testing {} approval", entity_type);

    let mut workflow = Workflow {
        client,
        checks: Vec::new(),
    };
    let outcome = match workflow.drive(descriptor, approver).await {
        Ok(observed) => ApprovalOutcome::Passed { observed },
        Err(failure) => {
            debug!("{} approval stopped at {}", entity_type, failure);
            ApprovalOutcome::Failed(failure)
        }
    };

    ApprovalReport {
        entity_type,
        checks: workflow.checks,
        outcome,
    }
}

struct Workflow<'a> {
    client: ApiClient<'a>,
    checks: Vec<Check>,
}

impl Workflow<'_> {
    async fn drive(
        &mut self,
        descriptor: &ApprovalDescriptor,
        approver: &str,
    ) -> Result<String, StepFailure> {
        let entity_type = descriptor.entity_type;

        let created = self
            .step(
                ApprovalStage::Created,
                format!("Create {entity_type}"),
                ApiRequest::post(&descriptor.create_endpoint, descriptor.payload.clone()),
                201,
            )
            .await?;
        let entity = self.handle(ApprovalStage::Created, &created)?;

        let filed = self
            .step(
                ApprovalStage::ApprovalFiled,
                "Create Approval Req".to_string(),
                ApiRequest::post(
                    APPROVAL_REQUESTS,
                    json!({
                        "approverId": approver,
                        "entityType": entity_type,
                        "entityId": entity.as_str(),
                        "comments": format!("Approve this {entity_type}"),
                    }),
                ),
                201,
            )
            .await?;
        let approval = self.handle(ApprovalStage::ApprovalFiled, &filed)?;

        self.step(
            ApprovalStage::Resolved,
            "Approve Req".to_string(),
            ApiRequest::patch(
                format!("{APPROVAL_REQUESTS}/{approval}/status"),
                json!({ "status": APPROVED }),
            ),
            200,
        )
        .await?;

        let fetched = self
            .step(
                ApprovalStage::Verified,
                format!("Verify {entity_type} Status"),
                ApiRequest::get(format!(
                    "{}/{}",
                    descriptor.create_endpoint.trim_end_matches('/'),
                    entity
                )),
                200,
            )
            .await?;

        let observed = fetched.body.data_str("status");
        let check = Check::value(
            format!("{entity_type} status updated"),
            &descriptor.expected_status,
            observed,
        );
        let passed = check.passed();
        self.checks.push(check);

        match observed {
            Some(status) if passed => Ok(status.to_string()),
            _ => Err(StepFailure {
                stage: ApprovalStage::Verified,
                kind: FailureKind::StatusMismatch {
                    expected: descriptor.expected_status.clone(),
                    observed: observed.map(str::to_string),
                },
            }),
        }
    }

    async fn step(
        &mut self,
        stage: ApprovalStage,
        name: String,
        request: ApiRequest,
        expected: u16,
    ) -> Result<Exchange, StepFailure> {
        let (check, exchange) = self.client.expect(name, &request, &[expected]).await;
        let actual = match &check.detail {
            Detail::Status { status, .. } => *status,
            _ => 0,
        };
        self.checks.push(check);

        exchange.ok_or(StepFailure {
            stage,
            kind: FailureKind::UnexpectedStatus { expected, actual },
        })
    }

    fn handle(
        &mut self,
        stage: ApprovalStage,
        exchange: &Exchange,
    ) -> Result<EntityHandle, StepFailure> {
        match EntityHandle::from_exchange(exchange) {
            Some(handle) => Ok(handle),
            None => {
                self.checks.push(Check::condition(
                    format!("Handle after {stage}"),
                    false,
                    "response data has no _id",
                ));
                Err(StepFailure {
                    stage,
                    kind: FailureKind::MissingHandle,
                })
            }
        }
    }
}
