use serde::{Deserialize, Serialize};

/// The authenticated principal as reported by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Display-only tag; never used for client-side authorization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl SessionIdentity {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

/// Outcome of resolving the current session.
///
/// Identity-fetch failures of every kind collapse into `Anonymous`. Match on
/// `Authenticated` rather than exhaustively so a dedicated transient-failure
/// case can be added without touching callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    Authenticated(SessionIdentity),
    #[default]
    Anonymous,
}

impl AuthState {
    #[must_use]
    pub fn identity(&self) -> Option<&SessionIdentity> {
        match self {
            AuthState::Authenticated(identity) => Some(identity),
            AuthState::Anonymous => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Authenticated(_) => "authenticated",
            AuthState::Anonymous => "anonymous",
        }
    }
}

impl From<Option<SessionIdentity>> for AuthState {
    fn from(value: Option<SessionIdentity>) -> Self {
        value.map_or(AuthState::Anonymous, AuthState::Authenticated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Resolving,
    Ready,
}

impl SessionPhase {
    #[must_use]
    pub fn is_ready(self) -> bool {
        self == SessionPhase::Ready
    }
}

/// Read-only view of the session handed to consumers such as route guards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub ready: bool,
    pub state: AuthState,
}

impl SessionSnapshot {
    #[must_use]
    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.state.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_keeps_server_shape() {
        let body = json!({"id": "1", "email": "a@b.com"});
        let identity: SessionIdentity = serde_json::from_value(body.clone()).expect("decode");
        assert_eq!(identity.name, None);
        assert_eq!(serde_json::to_value(&identity).expect("encode"), body);
    }

    #[test]
    fn identity_reads_camel_case_avatar() {
        let identity: SessionIdentity = serde_json::from_value(json!({
            "id": "7",
            "email": "x@y.org",
            "name": "Ada",
            "avatarUrl": "https://cdn.example/ada.png",
            "role": "student",
            "plan": "free"
        }))
        .expect("decode");
        assert_eq!(
            identity.avatar_url.as_deref(),
            Some("https://cdn.example/ada.png")
        );
        assert_eq!(identity.role.as_deref(), Some("student"));
        assert_eq!(identity.display_name(), "Ada");
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let identity = SessionIdentity {
            id: "1".to_string(),
            email: "a@b.com".to_string(),
            name: Some("  ".to_string()),
            avatar_url: None,
            role: None,
        };
        assert_eq!(identity.display_name(), "a@b.com");
    }

    #[test]
    fn auth_state_from_option() {
        assert_eq!(AuthState::from(None), AuthState::Anonymous);
        let identity = SessionIdentity {
            id: "1".to_string(),
            email: "a@b.com".to_string(),
            name: None,
            avatar_url: None,
            role: None,
        };
        let state = AuthState::from(Some(identity.clone()));
        assert!(state.is_authenticated());
        assert_eq!(state.identity(), Some(&identity));
        assert_eq!(state.as_str(), "authenticated");
    }
}
