/// Default base URL for the chat web app.
pub const DEFAULT_BASE_URL: &str = "https://gemini.google.com";

/// Path of the authenticated HTML page the session tokens are scraped from.
pub const BOOTSTRAP_PATH: &str = "/app";

/// Path of the streaming chat RPC.
pub const STREAM_GENERATE_PATH: &str =
    "/_/BardChatUi/data/assistant.lamda.BardFrontendService/StreamGenerate";

/// Normalize a base URL: trim whitespace and trailing slashes, default when empty.
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };

    base.trim_end_matches('/').to_string()
}

pub fn bootstrap_url(base_url: &str) -> String {
    format!("{}{BOOTSTRAP_PATH}", normalize_base_url(base_url))
}

pub fn stream_generate_url(base_url: &str) -> String {
    format!("{}{STREAM_GENERATE_PATH}", normalize_base_url(base_url))
}
