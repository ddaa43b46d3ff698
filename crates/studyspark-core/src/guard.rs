use crate::auth::SessionSnapshot;
use crate::constants::paths;

/// What a protected view should do for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session has not been resolved yet; render nothing.
    Pending,
    /// No session; send the user to the login entry point.
    RedirectToLogin { location: String },
    Allow,
}

#[must_use]
pub fn guard(snapshot: &SessionSnapshot, requested: &str) -> GuardDecision {
    if !snapshot.ready {
        return GuardDecision::Pending;
    }
    if snapshot.state.is_authenticated() {
        return GuardDecision::Allow;
    }
    GuardDecision::RedirectToLogin {
        location: login_redirect(requested),
    }
}

/// Builds `/login?next=<path+query>` with the whole requested location
/// encoded as a single query component.
#[must_use]
pub fn login_redirect(requested: &str) -> String {
    let requested = requested.trim();
    let requested = if requested.is_empty() {
        paths::APP_ROOT
    } else {
        requested
    };
    format!(
        "{}?next={}",
        paths::LOGIN_ROUTE,
        urlencoding::encode(requested)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthState, SessionIdentity};

    fn authenticated() -> SessionSnapshot {
        SessionSnapshot {
            ready: true,
            state: AuthState::Authenticated(SessionIdentity {
                id: "1".to_string(),
                email: "a@b.com".to_string(),
                name: None,
                avatar_url: None,
                role: None,
            }),
        }
    }

    #[test]
    fn pending_until_ready() {
        let snapshot = SessionSnapshot::default();
        assert_eq!(guard(&snapshot, "/dashboard"), GuardDecision::Pending);

        let mut snapshot = authenticated();
        snapshot.ready = false;
        assert_eq!(guard(&snapshot, "/dashboard"), GuardDecision::Pending);
    }

    #[test]
    fn anonymous_redirects_with_next() {
        let snapshot = SessionSnapshot {
            ready: true,
            state: AuthState::Anonymous,
        };
        assert_eq!(
            guard(&snapshot, "/dashboard"),
            GuardDecision::RedirectToLogin {
                location: "/login?next=%2Fdashboard".to_string()
            }
        );
    }

    #[test]
    fn redirect_preserves_query() {
        assert_eq!(
            login_redirect("/notes?tab=recent&id=4"),
            "/login?next=%2Fnotes%3Ftab%3Drecent%26id%3D4"
        );
        assert_eq!(login_redirect(""), "/login?next=%2F");
    }

    #[test]
    fn authenticated_is_allowed() {
        assert_eq!(guard(&authenticated(), "/dashboard"), GuardDecision::Allow);
    }
}
