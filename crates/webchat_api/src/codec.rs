//! Stateless encode/decode for the chat RPC wire format.
//!
//! Requests carry the turn as JSON embedded as a string inside another JSON
//! array, url-encoded into the `f.req` form field. Responses are an
//! XSSI-guarded stream of length-marker lines and JSON array lines; the chat
//! reply sits in a `wrb.fr` entry whose payload is itself a JSON string.

use rand::Rng;
use serde_json::{json, Value};

use crate::payload::{ChatTurnRequest, ConversationContext};

/// Anti-XSSI guard prepended to every response body.
pub const XSSI_PREFIX: &str = ")]}'";

/// First item of the response entry that carries an RPC result.
pub const RPC_RESULT_TAG: &str = "wrb.fr";

/// Exclusive upper bound of `_reqid`.
pub const REQUEST_ID_BOUND: u32 = 1_000_000;

/// Outcome of decoding a response body. Decoding never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedResponse {
    pub text: String,
    pub context: ConversationContext,
    /// Set when no `wrb.fr` entry carried a usable candidate and `text` is the raw body.
    pub fallback: bool,
}

impl DecodedResponse {
    fn raw(body: &str) -> Self {
        Self {
            text: body.to_owned(),
            context: ConversationContext::default(),
            fallback: true,
        }
    }
}

/// Prefix a system prompt onto the user message.
pub fn format_message(message: &str, system_prompt: Option<&str>) -> String {
    match system_prompt.filter(|prompt| !prompt.is_empty()) {
        Some(prompt) => format!("SYSTEM:\n{prompt}\n\nUSER:\n{message}"),
        None => message.to_owned(),
    }
}

/// `[conversationId, responseId, choiceId]`, `null` for each absent id.
pub fn build_context_array(context: &ConversationContext) -> Value {
    json!([
        context.conversation_id,
        context.response_id,
        context.choice_id
    ])
}

/// The `f.req` envelope before url-encoding: `[null, "<inner json>"]`.
pub fn encode_envelope(turn: &ChatTurnRequest) -> String {
    let message = format_message(&turn.message, turn.system_prompt.as_deref());
    let inner = json!([[message], Value::Null, build_context_array(&turn.context)]).to_string();

    json!([Value::Null, inner]).to_string()
}

/// Form body for one chat turn.
pub fn encode_request(turn: &ChatTurnRequest, nonce: &str) -> String {
    format!(
        "f.req={}&at={nonce}",
        urlencoding::encode(&encode_envelope(turn))
    )
}

/// Query parameters for the chat RPC, in wire order.
pub fn request_query(
    backend_version: &str,
    language: &str,
    request_id: u32,
) -> Vec<(&'static str, String)> {
    vec![
        ("bl", backend_version.to_owned()),
        ("hl", language.to_owned()),
        ("_reqid", request_id.to_string()),
        ("rt", "c".to_owned()),
    ]
}

/// Fresh `_reqid` in `[0, REQUEST_ID_BOUND)`.
pub fn next_request_id() -> u32 {
    rand::thread_rng().gen_range(0..REQUEST_ID_BOUND)
}

pub fn strip_xssi_prefix(raw: &str) -> &str {
    raw.strip_prefix(XSSI_PREFIX).unwrap_or(raw)
}

/// Decode a response body into reply text and continuation ids.
///
/// Falls back to the prefix-stripped body when no `wrb.fr` entry yields a
/// candidate, which covers auxiliary RPC replies and protocol drift.
pub fn decode_response(raw: &str) -> DecodedResponse {
    let body = strip_xssi_prefix(raw);

    for frame in parse_frames(body) {
        for entry in frame_entries(&frame) {
            if let Some(decoded) = decode_rpc_entry(entry) {
                return decoded;
            }
        }
    }

    tracing::debug!(len = body.len(), "no chat candidate in response; using raw body");
    DecodedResponse::raw(body)
}

/// First parse stage: every JSON line of the stream, skipping length markers and noise.
fn parse_frames(body: &str) -> impl Iterator<Item = Value> + '_ {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_length_marker(line))
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
}

fn is_length_marker(line: &str) -> bool {
    line.bytes().all(|byte| byte.is_ascii_digit())
}

/// Entries of a frame: the nested arrays of an array-of-arrays, or the frame itself.
fn frame_entries(frame: &Value) -> Vec<&Value> {
    match frame.as_array() {
        Some(items) if items.first().is_some_and(Value::is_array) => items.iter().collect(),
        Some(_) => vec![frame],
        None => Vec::new(),
    }
}

/// Second parse stage: the payload string of a `wrb.fr` entry.
fn decode_rpc_entry(entry: &Value) -> Option<DecodedResponse> {
    let entry = entry.as_array()?;
    if entry.first()?.as_str()? != RPC_RESULT_TAG {
        return None;
    }

    let payload: Value = serde_json::from_str(entry.get(2)?.as_str()?).ok()?;
    let candidate = payload.get(4)?.as_array()?.first()?;
    let text = candidate.get(1)?.as_array()?.first()?.as_str()?;

    let ids = payload.get(1).and_then(Value::as_array);
    let id_at = |index: usize| {
        ids.and_then(|ids| ids.get(index))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
    };

    Some(DecodedResponse {
        text: text.to_owned(),
        context: ConversationContext {
            conversation_id: id_at(0),
            response_id: id_at(1),
            choice_id: candidate
                .get(0)
                .and_then(Value::as_str)
                .map(ToOwned::to_owned),
        },
        fallback: false,
    })
}
