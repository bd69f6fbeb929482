//! Run-scoped session context

/// Credentials and identities established by the auth sequence.
///
/// Built once, then only read. There are no setters: a failed login leaves
/// the run with [`Session::anonymous`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user_id: Option<String>,
    tenant_id: Option<String>,
}

impl Session {
    /// Session without credentials
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(
        token: impl Into<String>,
        user_id: Option<String>,
        tenant_id: Option<String>,
    ) -> Self {
        Self {
            token: Some(token.into()),
            user_id,
            tenant_id,
        }
    }

    /// Token to send as a bearer credential, if logged in
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
