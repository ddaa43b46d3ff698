use clap::{Args, Subcommand};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Persist the backend base URL")]
    SetApiUrl(SetApiUrlArgs),
    #[command(about = "Persist the per-attempt request timeout")]
    SetTimeout(SetTimeoutArgs),
    #[command(about = "Persist retry budget and base backoff")]
    SetRetry(SetRetryArgs),
    #[command(about = "Print the stored configuration")]
    Show,
    #[command(about = "Forget all stored settings")]
    Reset,
}

#[derive(Args)]
pub struct SetApiUrlArgs {
    #[arg(help = "Backend base URL")]
    pub url: String,
}

#[derive(Args)]
pub struct SetTimeoutArgs {
    #[arg(help = "Seconds per attempt")]
    pub secs: u64,
}

#[derive(Args)]
pub struct SetRetryArgs {
    #[arg(long, help = "Total attempts, including the first")]
    pub max_attempts: Option<u32>,
    #[arg(long, help = "Delay before the first retry, doubled for each later one")]
    pub base_delay_ms: Option<u64>,
}

#[derive(Args)]
pub struct RequestArgs {
    #[arg(help = "HTTP method (GET, POST, PUT, DELETE, ...)")]
    pub method: String,
    #[arg(help = "Path relative to the api url, e.g. /auth/me")]
    pub path: String,
    #[arg(long, help = "JSON request body")]
    pub data: Option<String>,
}
