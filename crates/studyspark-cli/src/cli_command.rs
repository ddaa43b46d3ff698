use crate::cli_args::*;
use crate::modules::auth::{
    handle_login_command, handle_logout, handle_oauth_command, handle_register_command,
    handle_route, handle_status, handle_whoami,
};
use crate::modules::system::{handle_request_command, CommandContext};

pub(crate) async fn handle_command(
    command: Command,
    ctx: &CommandContext<'_>,
) -> anyhow::Result<()> {
    match command {
        Command::Whoami => handle_whoami(ctx)?,
        Command::Status => handle_status(ctx),
        Command::Login(args) => handle_login_command(args, ctx).await?,
        Command::Register(args) => handle_register_command(args, ctx).await?,
        Command::Logout => handle_logout(ctx).await,
        Command::Route(args) => handle_route(args, ctx).await,
        Command::OAuth(args) => handle_oauth_command(args, ctx).await?,
        Command::Request(args) => handle_request_command(args, ctx).await?,
        Command::Config(_) => anyhow::bail!("config commands do not use a session"),
    }

    Ok(())
}
