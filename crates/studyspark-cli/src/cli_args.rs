use clap::{ArgAction, Parser, Subcommand};

pub use crate::modules::auth::args::*;
pub use crate::modules::system::args::*;
use crate::modules::system::SessionStore;

#[derive(Parser)]
#[command(name = "studyspark")]
#[command(about = "StudySpark session client")]
pub struct Cli {
    #[arg(long, env = "STUDYSPARK_API_URL", help = "Backend base URL")]
    pub api_url: Option<String>,
    #[arg(long, help = "Per-attempt request timeout in seconds")]
    pub timeout: Option<u64>,
    #[arg(long, help = "Delay before the first retry in milliseconds")]
    pub retry_delay_ms: Option<u64>,
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(long, help = "Allow http:// to remote hosts and invalid TLS certificates")]
    pub insecure: bool,
    #[arg(
        long,
        env = "STUDYSPARK_SESSION_STORE",
        value_enum,
        default_value_t = SessionStore::Keyring,
        help = "Where session cookies are kept between runs"
    )]
    pub session_store: SessionStore,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Print the signed-in identity, or `anonymous`")]
    Whoami,
    #[command(about = "Show session readiness and state")]
    Status,
    Login(LoginArgs),
    Register(RegisterArgs),
    Logout,
    #[command(about = "Resolve a protected path against the current session")]
    Route(RouteArgs),
    #[command(name = "oauth")]
    OAuth(OAuthArgs),
    #[command(about = "Send a raw request through the retrying client")]
    Request(RequestArgs),
    Config(ConfigArgs),
}

impl Command {
    /// Commands that mount the session before running. The OAuth callback
    /// refreshes on its own.
    pub fn needs_session(&self) -> bool {
        match self {
            Command::Whoami
            | Command::Status
            | Command::Login(_)
            | Command::Register(_)
            | Command::Logout
            | Command::Route(_) => true,
            Command::OAuth(_) | Command::Request(_) | Command::Config(_) => false,
        }
    }
}
