//! Register, log in and resolve the current user

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::check::{Check, Section};
use crate::client::ApiClient;
use crate::session::Session;
use crate::transport::{ApiRequest, Transport};

pub const DEFAULT_PASSWORD: &str = "Password123!";

/// Account registered for one run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub tenant_name: String,
}

impl Registration {
    /// Fresh account with a unique email and tenant name
    pub fn generate(prefix: &str) -> Self {
        Self {
            email: format!("{prefix}-{}@example.com", short_id(8)),
            password: DEFAULT_PASSWORD.to_string(),
            first_name: "Verify".to_string(),
            last_name: "Tester".to_string(),
            tenant_name: format!("Tenant-{}", short_id(4)),
        }
    }
}

/// First `len` hex characters of a v4 UUID
pub fn short_id(len: usize) -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(len);
    id
}

/// Result of the auth sequence
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub section: Section,
    pub session: Session,
}

fn identities(user: Option<&Value>) -> (Option<String>, Option<String>) {
    let field = |key: &str| {
        user.and_then(|u| u.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    (field("_id"), field("tenantId"))
}

/// Run register → login → `/users/me`.
///
/// The session is built once at the end; a failed login yields an anonymous
/// session so every authenticated check downstream is skipped.
pub async fn authenticate(transport: &dyn Transport, registration: &Registration) -> AuthOutcome {
    let mut section = Section::new("Auth & User Info");
    let anonymous = Session::anonymous();
    let client = ApiClient::new(transport, &anonymous);

    let register = ApiRequest::post("/auth/register", json!(registration)).anonymous();
    let (check, registered) = client.expect("Register", &register, &[201]).await;
    section.push(check);
    if registered.is_none() {
        section.push(Check::skipped("Login", "registration failed"));
        return AuthOutcome {
            section,
            session: anonymous,
        };
    }
    info!("Registered {}", registration.email);

    let login = ApiRequest::post(
        "/auth/login",
        json!({ "email": registration.email, "password": registration.password }),
    )
    .anonymous();
    let (check, logged_in) = client.expect("Login", &login, &[200]).await;
    section.push(check);

    let Some(logged_in) = logged_in else {
        section.push(Check::skipped("Get Me", "login failed"));
        return AuthOutcome {
            section,
            session: anonymous,
        };
    };
    let Some(token) = logged_in.body.data_str("accessToken").map(str::to_string) else {
        section.push(Check::condition("Access token", false, "login response has no accessToken"));
        section.push(Check::skipped("Get Me", "no access token"));
        return AuthOutcome {
            section,
            session: anonymous,
        };
    };

    let (login_user, login_tenant) = identities(logged_in.body.data().and_then(|d| d.get("user")));

    // `/users/me` needs the token, so ask with a provisional session first
    let provisional = Session::authenticated(token.clone(), None, None);
    let (check, me) = ApiClient::new(transport, &provisional)
        .expect("Get Me", &ApiRequest::get("/users/me"), &[200])
        .await;
    section.push(check);

    let (user_id, tenant_id) = match me {
        Some(me) => {
            let (user, tenant) = identities(me.body.data());
            (user.or(login_user), tenant.or(login_tenant))
        }
        None => {
            warn!("/users/me unavailable, using identities from the login response");
            (login_user, login_tenant)
        }
    };

    info!("Logged in. UserID: {}", user_id.as_deref().unwrap_or("<unknown>"));
    AuthOutcome {
        section,
        session: Session::authenticated(token, user_id, tenant_id),
    }
}
