use studyspark_core::{next_destination, AuthState};
use tracing::info;

use super::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OAuthCompletion {
    pub next: String,
    pub state: AuthState,
}

/// Runs after the provider hands control back: the backend has already set
/// the session cookie, so refresh once and go to `next` either way.
pub(crate) async fn complete_oauth_callback(
    session: &SessionContext,
    return_url: &str,
) -> OAuthCompletion {
    let state = session.refresh().await;
    let next = next_destination(return_url);
    info!(next = %next, state = state.as_str(), "oauth callback completed");
    OAuthCompletion { next, state }
}
