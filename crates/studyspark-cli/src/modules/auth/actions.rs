use studyspark_core::{guard, AuthState, GuardDecision, OAuthProvider};
use tracing::debug;

use crate::cli_args::*;
use crate::modules::auth::complete_oauth_callback;
use crate::modules::auth::types::AuthError;
use crate::modules::system::CommandContext;
use crate::prompt_password;

pub(crate) async fn handle_login_command(
    args: LoginArgs,
    ctx: &CommandContext<'_>,
) -> anyhow::Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => prompt_password("Password: ")?,
    };
    let state = ctx
        .session
        .login(args.email.trim(), &password)
        .await
        .map_err(credentials_error)?;
    report_credentials_outcome(&state, "Logged in");
    Ok(())
}

pub(crate) async fn handle_register_command(
    args: RegisterArgs,
    ctx: &CommandContext<'_>,
) -> anyhow::Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => prompt_password("Password: ")?,
    };
    let state = ctx
        .session
        .register(args.name.trim(), args.email.trim(), &password)
        .await
        .map_err(credentials_error)?;
    report_credentials_outcome(&state, "Registered");
    Ok(())
}

/// Surfaces the same reason a sign-in form would show inline.
fn credentials_error(err: AuthError) -> anyhow::Error {
    debug!(error = %err, "credential exchange failed");
    match err.status() {
        Some(status) => anyhow::anyhow!("{} (HTTP {status})", err.reason()),
        None => anyhow::anyhow!("{}", err.reason()),
    }
}

fn report_credentials_outcome(state: &AuthState, verb: &str) {
    match state.identity() {
        Some(identity) => println!("{verb} as {}", identity.email),
        None => eprintln!("Warning: server accepted the credentials but no session was established"),
    }
}

pub(crate) async fn handle_logout(ctx: &CommandContext<'_>) {
    ctx.session.logout().await;
    println!("Logged out");
}

pub(crate) fn handle_whoami(ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    match ctx.session.identity() {
        Some(identity) => println!("{}", serde_json::to_string_pretty(&identity)?),
        None => println!("anonymous"),
    }
    Ok(())
}

pub(crate) fn handle_status(ctx: &CommandContext<'_>) {
    let snapshot = ctx.session.snapshot();
    println!("api_url: {}", ctx.api_url);
    println!("ready: {}", snapshot.ready);
    println!("state: {}", snapshot.state.as_str());
    if let Some(identity) = snapshot.identity() {
        println!("user: {} <{}>", identity.display_name(), identity.email);
        if let Some(role) = identity.role.as_deref() {
            println!("role: {role}");
        }
    }
}

pub(crate) async fn handle_route(args: RouteArgs, ctx: &CommandContext<'_>) {
    ctx.session.wait_ready().await;
    match guard(&ctx.session.snapshot(), &args.path) {
        GuardDecision::Allow => println!("{}", args.path),
        GuardDecision::RedirectToLogin { location } => println!("{location}"),
        GuardDecision::Pending => println!("pending"),
    }
}

pub(crate) async fn handle_oauth_command(
    args: OAuthArgs,
    ctx: &CommandContext<'_>,
) -> anyhow::Result<()> {
    match args.command {
        OAuthCommand::Url(args) => {
            let provider: OAuthProvider = args.provider.parse()?;
            println!("{}", provider.authorize_url(ctx.api_url));
        }
        OAuthCommand::Callback(args) => {
            let completion = complete_oauth_callback(ctx.session, &args.return_url).await;
            if let Some(identity) = completion.state.identity() {
                eprintln!("Signed in as {}", identity.email);
            }
            println!("{}", completion.next);
        }
    }
    Ok(())
}
