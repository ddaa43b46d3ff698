mod actions;
pub(crate) mod args;
pub(crate) mod config;
pub(crate) mod errors;
pub(crate) mod http;
mod secrets;
pub(crate) mod types;

pub(crate) use actions::handle_request_command;
pub(crate) use config::{
    config_dir, ensure_secure_addr, handle_config_command, load_config, load_session_cookies,
    resolve_api_url, save_config, save_session_cookies,
};
pub(crate) use errors::RequestError;
pub(crate) use http::{ApiClient, ApiClientOptions, ApiRequest};
pub(crate) use types::{CommandContext, SessionStore};
