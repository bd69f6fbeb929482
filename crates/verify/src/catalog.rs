//! Default approval table and the fixtures it depends on

use serde_json::json;

use crate::approval::{ApprovalDescriptor, ApprovalEntityType, EntityHandle};
use crate::auth::short_id;
use crate::check::Check;
use crate::client::ApiClient;
use crate::transport::ApiRequest;

/// Resources created before the approval table runs
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    /// Parent project for the task descriptor
    pub project: Option<EntityHandle>,
}

/// Create the parent project used by the task scenario
pub async fn prepare_fixtures(client: ApiClient<'_>) -> (Check, Fixtures) {
    let request = ApiRequest::post("/projects", json!({ "name": "Test Project" }));
    let (mut check, exchange) = client.expect("Create fixture project", &request, &[201]).await;

    let project = exchange.as_ref().and_then(EntityHandle::from_exchange);
    if exchange.is_some() && project.is_none() {
        check = Check::condition("Create fixture project", false, "response data has no _id");
    }

    (check, Fixtures { project })
}

/// Table entry, or the reason it cannot run this time
pub type CatalogEntry = Result<ApprovalDescriptor, (ApprovalEntityType, &'static str)>;

/// Invoice, project deliverable and task, in that order.
///
/// The invoice bills the session user; the task needs the fixture project
/// and is reported unavailable without it.
pub fn default_descriptors(user_id: Option<&str>, fixtures: &Fixtures) -> Vec<CatalogEntry> {
    let invoice = ApprovalDescriptor::new(
        ApprovalEntityType::Invoice,
        "/invoices",
        json!({
            "clientId": user_id,
            "invoiceNumber": format!("INV-{}", short_id(6)),
            "issueDate": "2024-02-01T00:00:00Z",
            "dueDate": "2024-03-01T00:00:00Z",
            "items": [
                { "description": "Service Alpha", "quantity": 1, "unitPrice": 5000 }
            ],
            "currency": "USD"
        }),
        "sent",
    );

    let deliverable = ApprovalDescriptor::new(
        ApprovalEntityType::ProjectDeliverable,
        "/projects",
        json!({
            "name": format!("Deliv-{}", short_id(4)),
            "description": "Test deliverable"
        }),
        "completed",
    );

    let task = match &fixtures.project {
        Some(project) => Ok(ApprovalDescriptor::new(
            ApprovalEntityType::Task,
            "/tasks",
            json!({
                "projectId": project.as_str(),
                "title": format!("Task-{}", short_id(4)),
                "priority": "high"
            }),
            "done",
        )),
        None => Err((ApprovalEntityType::Task, "no fixture project")),
    };

    vec![Ok(invoice), Ok(deliverable), task]
}
