use studyspark_core::ErrorBody;

use crate::modules::system::RequestError;

pub(crate) const GENERIC_AUTH_FAILURE: &str = "authentication failed";
pub(crate) const UNREACHABLE_REASON: &str = "unable to reach the server";

/// Failure of a credential exchange (login or register).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{reason}")]
    Rejected { status: u16, reason: String },
    #[error("unable to reach the server: {source}")]
    Unreachable {
        #[source]
        source: RequestError,
    },
}

impl AuthError {
    /// Human-readable reason suitable for inline display next to a form.
    pub fn reason(&self) -> &str {
        match self {
            AuthError::Rejected { reason, .. } => reason,
            AuthError::Unreachable { .. } => UNREACHABLE_REASON,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Rejected { status, .. } => Some(*status),
            AuthError::Unreachable { source } => source.status(),
        }
    }
}

impl From<RequestError> for AuthError {
    fn from(err: RequestError) -> Self {
        let Some(status) = err.status() else {
            return AuthError::Unreachable { source: err };
        };
        let reason = err
            .body()
            .and_then(ErrorBody::reason_from_value)
            .unwrap_or_else(|| GENERIC_AUTH_FAILURE.to_string());
        AuthError::Rejected { status, reason }
    }
}
