//! Process-wide authentication state, owned by one explicitly constructed
//! [`SessionContext`].
//!
//! Identity is never guessed on the client: every transition into
//! `Authenticated` goes through `GET /auth/me`. Mutating operations are
//! queued behind a single async mutex, so a caller awaiting `login` observes
//! the rehydrated state as soon as it returns.

use std::sync::{PoisonError, RwLock};

use studyspark_core::{
    paths, AuthState, LoginRequest, RegisterRequest, SessionIdentity, SessionPhase,
    SessionSnapshot,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::types::AuthError;
use crate::modules::system::{ApiClient, ApiRequest};

pub(crate) struct SessionContext {
    api: ApiClient,
    state: RwLock<AuthState>,
    phase: watch::Sender<SessionPhase>,
    mutation: Mutex<()>,
}

impl SessionContext {
    pub fn new(api: ApiClient) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Uninitialized);
        Self {
            api,
            state: RwLock::new(AuthState::Anonymous),
            phase,
            mutation: Mutex::new(()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Tears the context down, handing back the client so its cookies can be
    /// persisted.
    pub fn into_client(self) -> ApiClient {
        self.api
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.phase().is_ready()
    }

    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn identity(&self) -> Option<SessionIdentity> {
        self.state().identity().cloned()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            ready: self.is_ready(),
            state: self.state(),
        }
    }

    pub async fn wait_ready(&self) {
        let mut phase = self.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = phase.wait_for(|phase| phase.is_ready()).await;
    }

    /// First resolution of the session. Later calls behave like `refresh`.
    pub async fn mount(&self) -> AuthState {
        let _guard = self.mutation.lock().await;
        self.refresh_locked().await
    }

    /// Re-syncs local state with the server. Never fails: any error while
    /// fetching the identity resolves to `Anonymous`.
    pub async fn refresh(&self) -> AuthState {
        let _guard = self.mutation.lock().await;
        self.refresh_locked().await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthState, AuthError> {
        let _guard = self.mutation.lock().await;
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        if let Err(err) = self.api.post_json(paths::AUTH_LOGIN, &payload).await {
            warn!(email = %email, error = %err, "login rejected");
            return Err(err.into());
        }
        info!(email = %email, "login accepted; rehydrating session");
        Ok(self.refresh_locked().await)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthState, AuthError> {
        let _guard = self.mutation.lock().await;
        let payload = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        if let Err(err) = self.api.post_json(paths::AUTH_REGISTER, &payload).await {
            warn!(email = %email, error = %err, "registration rejected");
            return Err(err.into());
        }
        info!(email = %email, "registration accepted; rehydrating session");
        Ok(self.refresh_locked().await)
    }

    /// Asks the server to drop the session, then clears local state whatever
    /// the server answered. Readiness is left as it was: only a resolved
    /// `/auth/me` makes the context ready.
    pub async fn logout(&self) {
        let _guard = self.mutation.lock().await;
        match self.api.send(ApiRequest::post(paths::AUTH_LOGOUT)).await {
            Ok(_) => info!("server session closed"),
            Err(err) => warn!(error = %err, "server logout failed; clearing local session anyway"),
        }
        self.api.clear_cookies();
        self.set_state(AuthState::Anonymous);
    }

    async fn refresh_locked(&self) -> AuthState {
        self.begin_resolving();
        let state = match self.api.get_json::<SessionIdentity>(paths::AUTH_ME).await {
            Ok(identity) => {
                debug!(user_id = %identity.id, "session resolved");
                AuthState::Authenticated(identity)
            }
            Err(err) => {
                debug!(error = %err, "no session; treating as anonymous");
                AuthState::Anonymous
            }
        };
        self.set_state(state.clone());
        self.mark_ready();
        state
    }

    fn set_state(&self, state: AuthState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn begin_resolving(&self) {
        self.phase.send_if_modified(|phase| {
            if *phase != SessionPhase::Uninitialized {
                return false;
            }
            *phase = SessionPhase::Resolving;
            true
        });
    }

    fn mark_ready(&self) {
        self.phase.send_if_modified(|phase| {
            if phase.is_ready() {
                return false;
            }
            *phase = SessionPhase::Ready;
            true
        });
    }
}
