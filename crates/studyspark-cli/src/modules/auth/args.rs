use clap::{Args, Subcommand};

#[derive(Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "STUDYSPARK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "STUDYSPARK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct RouteArgs {
    #[arg(help = "Requested application path, with query (e.g. /dashboard)")]
    pub path: String,
}

#[derive(Args)]
pub struct OAuthArgs {
    #[command(subcommand)]
    pub command: OAuthCommand,
}

#[derive(Subcommand)]
pub enum OAuthCommand {
    #[command(about = "Print the backend URL that starts a provider login")]
    Url(OAuthUrlArgs),
    #[command(about = "Finish a provider login from the URL it returned to")]
    Callback(OAuthCallbackArgs),
}

#[derive(Args)]
pub struct OAuthUrlArgs {
    #[arg(help = "google or github")]
    pub provider: String,
}

#[derive(Args)]
pub struct OAuthCallbackArgs {
    #[arg(help = "Return URL, e.g. http://localhost:5173/oauth/callback?next=%2Fdashboard")]
    pub return_url: String,
}
