use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "chatshell",
    version,
    about = "Talk to the chat web app from the terminal"
)]
pub struct Cli {
    /// Web app origin; overrides CHATSHELL_BASE_URL.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// `hl` language code; overrides CHATSHELL_LANGUAGE.
    #[arg(long, global = true, value_name = "CODE")]
    pub language: Option<String>,

    /// Credential file; overrides CHATSHELL_CREDENTIALS_PATH.
    #[arg(long, global = true, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Request timeout in seconds; overrides CHATSHELL_TIMEOUT_SECS.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Extra attempts for transient failures (network errors, 429, 5xx).
    #[arg(long, global = true, default_value_t = 0)]
    pub retries: u32,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one message and print the reply.
    Ask(AskArgs),
    /// Interactive conversation on stdin.
    Chat(ChatArgs),
    /// Manage the stored auth cookies.
    Credentials(CredentialsCommand),
}

#[derive(Args, Debug)]
pub struct AskArgs {
    pub message: String,

    /// Instructions sent ahead of the message.
    #[arg(long)]
    pub system: Option<String>,

    #[arg(long, requires_all = ["response_id", "choice_id"])]
    pub conversation_id: Option<String>,

    #[arg(long, requires = "conversation_id")]
    pub response_id: Option<String>,

    #[arg(long, requires = "conversation_id")]
    pub choice_id: Option<String>,

    /// Print the reply and continuation ids as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Instructions sent ahead of every message.
    #[arg(long)]
    pub system: Option<String>,
}

#[derive(Args, Debug)]
pub struct CredentialsCommand {
    #[command(subcommand)]
    pub command: CredentialsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CredentialsSubcommand {
    /// Store the two auth cookies copied from a signed-in browser.
    Set {
        #[arg(long, value_name = "VALUE")]
        psid: String,
        #[arg(long, value_name = "VALUE")]
        psidts: String,
    },
    /// Show which auth cookies are stored, with values masked.
    Show,
}
