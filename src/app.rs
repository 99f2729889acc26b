use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use credential_store::FileCredentialStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use webchat_api::cookies::{is_sendable_cookie_part, AUTH_COOKIES, PSIDTS_COOKIE, PSID_COOKIE};
use webchat_api::retry::{is_retryable, retry_delay};
use webchat_api::{
    ChatTurnRequest, ChatTurnResult, ConversationContext, CookieJar, ErrorKind, WebChatClient,
    WebChatConfig, WebChatError,
};

use crate::cli::{AskArgs, ChatArgs, Cli, Command, CredentialsSubcommand};
use crate::commands::{parse_slash_command, SlashCommand, HELP_TEXT};
use crate::config::EnvConfig;

/// Flags layered over the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: WebChatConfig,
    pub credentials_path: Option<PathBuf>,
    pub retries: u32,
}

impl Settings {
    pub fn resolve(cli: &Cli, env: &EnvConfig) -> Self {
        let mut config = WebChatConfig::new();
        if let Some(base_url) = cli.base_url.clone().or_else(|| env.base_url.clone()) {
            config = config.with_base_url(base_url);
        }
        if let Some(language) = cli.language.clone().or_else(|| env.language.clone()) {
            config = config.with_language(language);
        }
        let timeout = cli
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .or(env.timeout);
        if let Some(timeout) = timeout {
            config = config.with_timeout(timeout);
        }

        Self {
            config,
            credentials_path: cli
                .credentials
                .clone()
                .or_else(|| env.credentials_path.clone()),
            retries: cli.retries,
        }
    }

    pub fn credential_store(&self) -> Result<FileCredentialStore> {
        match &self.credentials_path {
            Some(path) => Ok(FileCredentialStore::new(path)),
            None => FileCredentialStore::at_default_location()
                .context("cannot locate the credential file"),
        }
    }

    pub fn client(&self) -> Result<WebChatClient> {
        let store = self.credential_store()?;
        tracing::debug!(path = %store.path().display(), "using credential file");
        WebChatClient::new(self.config.clone(), Arc::new(store))
            .context("failed to set up the HTTP client")
    }
}

pub async fn run(cli: Cli, env: EnvConfig) -> Result<()> {
    let settings = Settings::resolve(&cli, &env);

    match cli.command {
        Command::Ask(args) => ask(&settings, args).await,
        Command::Chat(args) => chat(&settings, args).await,
        Command::Credentials(command) => credentials(&settings, command.command),
    }
}

async fn ask(settings: &Settings, args: AskArgs) -> Result<()> {
    let client = settings.client()?;
    let json = args.json;
    let turn = ask_turn(args);

    let result = send_with_retries(&client, &turn, settings.retries).await?;
    if json {
        let encoded =
            serde_json::to_string_pretty(&result).context("failed to encode reply as JSON")?;
        println!("{encoded}");
    } else {
        println!("{}", result.text);
    }
    Ok(())
}

fn ask_turn(args: AskArgs) -> ChatTurnRequest {
    let context = ConversationContext {
        conversation_id: args.conversation_id,
        response_id: args.response_id,
        choice_id: args.choice_id,
    };
    let mut turn = ChatTurnRequest::new(args.message).with_context(context);
    if let Some(system) = args.system {
        turn = turn.with_system_prompt(system);
    }
    turn
}

async fn chat(settings: &Settings, args: ChatArgs) -> Result<()> {
    let client = settings.client()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut context = ConversationContext::default();

    loop {
        eprint!("> ");
        let _ = std::io::stderr().flush();

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        match parse_slash_command(message) {
            Some(SlashCommand::Exit) => break,
            Some(SlashCommand::New) => {
                context = ConversationContext::default();
                eprintln!("started a new conversation");
                continue;
            }
            Some(SlashCommand::Help) => {
                eprintln!("{HELP_TEXT}");
                continue;
            }
            Some(SlashCommand::Unknown(name)) => {
                eprintln!("unknown command {name}; /help lists commands");
                continue;
            }
            None => {}
        }

        let mut turn = ChatTurnRequest::new(message).with_context(context.clone());
        if let Some(system) = &args.system {
            turn = turn.with_system_prompt(system.clone());
        }

        match send_with_retries(&client, &turn, settings.retries).await {
            Ok(result) => {
                println!("{}\n", result.text);
                context = result.context;
            }
            Err(error) if error.kind() == ErrorKind::Configuration => return Err(error.into()),
            Err(error) => {
                if error.kind() == ErrorKind::ProtocolStatus {
                    // A rejected call may mean a stale nonce; bootstrap again next turn.
                    client.session().invalidate().await;
                }
                eprintln!("error: {error}");
                if let Some(hint) = error.remediation() {
                    eprintln!("hint: {hint}");
                }
            }
        }
    }

    Ok(())
}

/// Retry transient failures with exponential backoff; the client itself never retries.
pub async fn send_with_retries(
    client: &WebChatClient,
    turn: &ChatTurnRequest,
    retries: u32,
) -> Result<ChatTurnResult, WebChatError> {
    let mut attempt = 0;
    loop {
        match client.send_turn(turn).await {
            Ok(result) => return Ok(result),
            Err(error) if attempt < retries && is_retryable(&error) => {
                let delay = retry_delay(attempt);
                tracing::warn!(
                    %error,
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "retrying chat turn"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

fn credentials(settings: &Settings, command: CredentialsSubcommand) -> Result<()> {
    let store = settings.credential_store()?;

    match command {
        CredentialsSubcommand::Set { psid, psidts } => {
            let mut jar = match store.load() {
                Ok(jar) => jar,
                Err(error) => {
                    tracing::warn!(%error, "replacing unreadable credential file");
                    CookieJar::new()
                }
            };
            jar.insert(PSID_COOKIE, checked_cookie_value("--psid", &psid)?);
            jar.insert(PSIDTS_COOKIE, checked_cookie_value("--psidts", &psidts)?);
            store
                .save(&jar)
                .with_context(|| format!("failed to write {}", store.path().display()))?;
            eprintln!("saved credentials to {}", store.path().display());
        }
        CredentialsSubcommand::Show => {
            let jar = store
                .load()
                .with_context(|| format!("failed to read {}", store.path().display()))?;
            println!("{}", store.path().display());
            for name in AUTH_COOKIES {
                let state = jar
                    .get(name)
                    .filter(|value| !value.trim().is_empty())
                    .map(mask)
                    .unwrap_or_else(|| "missing".to_string());
                println!("  {name}: {state}");
            }
            let others = jar
                .iter()
                .filter(|(name, _)| !AUTH_COOKIES.contains(name))
                .count();
            if others > 0 {
                println!("  ({others} other cookies)");
            }
        }
    }

    Ok(())
}

/// Trimmed cookie value, rejected when it cannot be sent in a request header.
fn checked_cookie_value<'a>(flag: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        bail!("{flag} must not be empty");
    }
    if !is_sendable_cookie_part(value) {
        bail!("{flag} contains line breaks, `;` or non-ASCII characters; copy the cookie value again");
    }
    Ok(value)
}

/// First four characters, then the length.
fn mask(value: &str) -> String {
    let count = value.chars().count();
    if count <= 8 {
        return format!("set ({count} chars)");
    }
    let head: String = value.chars().take(4).collect();
    format!("{head}… ({count} chars)")
}
