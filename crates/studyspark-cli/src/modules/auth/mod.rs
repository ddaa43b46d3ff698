mod actions;
pub(crate) mod args;
mod oauth;
mod session;
pub(crate) mod types;

pub(crate) use actions::{
    handle_login_command, handle_logout, handle_oauth_command, handle_register_command,
    handle_route, handle_status, handle_whoami,
};
pub(crate) use oauth::complete_oauth_callback;
#[cfg(test)]
pub(crate) use oauth::OAuthCompletion;
pub(crate) use session::SessionContext;
#[cfg(test)]
pub(crate) use types::{AuthError, GENERIC_AUTH_FAILURE};
