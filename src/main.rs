mod app;
mod cli;
mod commands;
mod config;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use webchat_api::WebChatError;

use crate::cli::Cli;
use crate::config::EnvConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = EnvConfig::from_env();
    logging::init(env.log_filter.as_deref(), cli.verbose);

    match app::run(cli, env).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            if let Some(hint) = error
                .downcast_ref::<WebChatError>()
                .and_then(WebChatError::remediation)
            {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}
