#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    New,
    Exit,
    Unknown(String),
}

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let command = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_string();

    let parsed = match command.as_str() {
        "/help" => SlashCommand::Help,
        "/new" => SlashCommand::New,
        "/exit" | "/quit" => SlashCommand::Exit,
        _ => SlashCommand::Unknown(command),
    };

    Some(parsed)
}

pub const HELP_TEXT: &str = "/new   start a new conversation\n/exit  quit\n/help  show this help";
