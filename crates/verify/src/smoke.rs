//! Single-call smoke checks across the API surface

use serde_json::{json, Value};

use crate::approval::EntityHandle;
use crate::check::{Check, Section};
use crate::client::ApiClient;
use crate::transport::ApiRequest;

const SEARCH_PROJECT: &str = "Project Alpha";

/// Handles created by the smoke run, removed again in the cleanup section
#[derive(Debug, Default)]
struct Created {
    project: Option<EntityHandle>,
    task: Option<EntityHandle>,
}

/// Run every smoke section in order
pub async fn run_smoke(client: ApiClient<'_>) -> Vec<Section> {
    let mut created = Created::default();

    vec![
        system(client).await,
        users(client).await,
        projects(client, &mut created).await,
        tasks(client, &mut created).await,
        messages(client, &created).await,
        analytics(client).await,
        cleanup(client, &created).await,
    ]
}

async fn system(client: ApiClient<'_>) -> Section {
    let mut section = Section::new("System");
    for path in ["/health", "/info"] {
        let (check, _) = client
            .expect(format!("GET {path}"), &ApiRequest::get(path).anonymous(), &[200])
            .await;
        section.push(check);
    }
    section
}

async fn users(client: ApiClient<'_>) -> Section {
    let mut section = Section::new("Users");
    let (check, _) = client
        .expect("GET /users/me", &ApiRequest::get("/users/me"), &[200])
        .await;
    section.push(check);
    section
}

async fn projects(client: ApiClient<'_>, created: &mut Created) -> Section {
    let mut section = Section::new("Projects");

    let create = ApiRequest::post(
        "/projects",
        json!({
            "name": SEARCH_PROJECT,
            "description": "Verification research",
            "clientName": "Global Corp"
        }),
    );
    let (check, exchange) = client.expect("POST /projects", &create, &[201]).await;
    section.push(check);
    created.project = exchange.as_ref().and_then(EntityHandle::from_exchange);

    let (check, exchange) = client
        .expect(
            "GET /projects?search=Alpha",
            &ApiRequest::get("/projects?search=Alpha"),
            &[200],
        )
        .await;
    section.push(check);

    if let Some(exchange) = exchange {
        let found = exchange
            .body
            .data()
            .and_then(Value::as_array)
            .is_some_and(|items| {
                items
                    .iter()
                    .any(|p| p.get("name").and_then(Value::as_str) == Some(SEARCH_PROJECT))
            });
        section.push(Check::condition(
            "Search finds project",
            found,
            format!("looking for {SEARCH_PROJECT}"),
        ));

        let total = exchange.body.meta().and_then(|m| m.get("total"));
        section.push(Check::condition(
            "Pagination meta",
            total.is_some(),
            match total {
                Some(total) => format!("total={total}"),
                None => "meta.total missing".to_string(),
            },
        ));
    }

    section
}

async fn tasks(client: ApiClient<'_>, created: &mut Created) -> Section {
    let mut section = Section::new("Tasks");

    let Some(project) = &created.project else {
        section.push(Check::skipped("POST /tasks", "no project"));
        section.push(Check::skipped("GET /tasks/id", "no task"));
        return section;
    };

    let create = ApiRequest::post(
        "/tasks",
        json!({
            "title": "Verif Task",
            "projectId": project.as_str(),
            "priority": "medium"
        }),
    );
    let (check, exchange) = client.expect("POST /tasks", &create, &[201]).await;
    section.push(check);
    created.task = exchange.as_ref().and_then(EntityHandle::from_exchange);

    match &created.task {
        Some(task) => {
            let (check, _) = client
                .expect("GET /tasks/id", &ApiRequest::get(format!("/tasks/{task}")), &[200])
                .await;
            section.push(check);
        }
        None => {
            section.push(Check::skipped("GET /tasks/id", "no task"));
        }
    }

    section
}

async fn messages(client: ApiClient<'_>, created: &Created) -> Section {
    let mut section = Section::new("Messages");

    let Some(project) = &created.project else {
        section.push(Check::skipped("POST /messages", "no project"));
        return section;
    };

    let create = ApiRequest::post(
        "/messages",
        json!({ "content": "Verification message", "projectId": project.as_str() }),
    );
    let (check, _) = client.expect("POST /messages", &create, &[201]).await;
    section.push(check);
    section
}

async fn analytics(client: ApiClient<'_>) -> Section {
    let mut section = Section::new("Analytics & Logs");
    for path in ["/analytics/dashboard", "/activity-logs/me"] {
        let (check, _) = client
            .expect(format!("GET {path}"), &ApiRequest::get(path), &[200])
            .await;
        section.push(check);
    }
    section
}

async fn cleanup(client: ApiClient<'_>, created: &Created) -> Section {
    let mut section = Section::new("Cleanup");

    // Tasks first; the project owns them.
    if let Some(task) = &created.task {
        let (check, _) = client
            .expect("DELETE /tasks/id", &ApiRequest::delete(format!("/tasks/{task}")), &[200])
            .await;
        section.push(check);
    }
    if let Some(project) = &created.project {
        let (check, _) = client
            .expect(
                "DELETE /projects/id",
                &ApiRequest::delete(format!("/projects/{project}")),
                &[200],
            )
            .await;
        section.push(check);
    }

    section
}
