use clap::Parser;
use std::io::{self, Write};
use std::time::Duration;

mod cli_args;
mod cli_command;
mod modules;

use crate::cli_args::*;
use crate::cli_command::handle_command;
use crate::modules::auth::SessionContext;
use crate::modules::system::http::DEFAULT_TIMEOUT_SECS;
use crate::modules::system::{
    config_dir, ensure_secure_addr, handle_config_command, load_config, load_session_cookies,
    resolve_api_url, save_config, save_session_cookies, ApiClient, ApiClientOptions,
    CommandContext,
};
use tracing_subscriber::EnvFilter;

/// Read when neither `--api-url` nor `STUDYSPARK_API_URL` is set.
pub(crate) const FALLBACK_API_URL_ENV: &str = "VITE_API_URL";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let mut config = load_config()?;

    let command = match cli.command {
        Command::Config(args) => {
            handle_config_command(args, &mut config)?;
            save_config(&config)?;
            return Ok(());
        }
        command => command,
    };

    let api_url = resolve_api_url(cli.api_url, &config);
    ensure_secure_addr(&api_url, cli.insecure)?;
    let timeout_secs = cli
        .timeout
        .or(config.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
        .max(1);
    let options = ApiClientOptions {
        timeout: Duration::from_secs(timeout_secs),
        retry: config.retry.policy(cli.retry_delay_ms),
        allow_invalid_certs: cli.insecure,
    };
    let api = ApiClient::new(&api_url, options)?;
    let session_dir = config_dir()?;
    let restored = load_session_cookies(&session_dir, &api_url)?;
    api.restore_cookies(&restored);

    let session = SessionContext::new(api);
    if command.needs_session() {
        session.mount().await;
    }
    let ctx = CommandContext {
        session: &session,
        api_url: &api_url,
    };
    let result = handle_command(command, &ctx).await;

    let cookies = session.into_client().session_cookies();
    if cookies != restored {
        save_session_cookies(&session_dir, &api_url, cli.session_store, cookies)?;
    }
    result
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

pub(crate) fn prompt_password(prompt: &str) -> anyhow::Result<String> {
    eprint!("{prompt}");
    io::stderr().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let password = input.trim_end_matches(&['\r', '\n'][..]).to_string();
    if password.trim().is_empty() {
        anyhow::bail!("password is required");
    }
    Ok(password)
}
