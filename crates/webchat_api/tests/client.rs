use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use webchat_api::cookies::{PSIDTS_COOKIE, PSID_COOKIE};
use webchat_api::{
    ChatTurnRequest, ConversationContext, CookieJar, ErrorKind, HttpReply, MemoryCredentialStore,
    Session, Transport, WebChatClient, WebChatConfig, WebChatError,
};

const BOOTSTRAP_PAGE: &str =
    r#"<script>window.WIZ_global_data = {"SNlM0e":"nonce-abc","cfb2h":"boq_assistant-bard-web-server_test"};</script>"#;

#[derive(Debug, Clone)]
struct RecordedPost {
    url: String,
    query: Vec<(&'static str, String)>,
    body: String,
    cookies: CookieJar,
}

/// Replays canned replies and records what the client sent.
#[derive(Default)]
struct ScriptedTransport {
    pages: Mutex<VecDeque<HttpReply>>,
    replies: Mutex<VecDeque<HttpReply>>,
    gets: Mutex<Vec<String>>,
    posts: Mutex<Vec<RecordedPost>>,
}

impl ScriptedTransport {
    fn new(pages: Vec<HttpReply>, replies: Vec<HttpReply>) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(pages.into()),
            replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    fn get_count(&self) -> usize {
        self.gets.lock().expect("gets").len()
    }

    fn posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().expect("posts").clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, _cookies: &CookieJar) -> Result<HttpReply, WebChatError> {
        self.gets.lock().expect("gets").push(url.to_owned());
        Ok(self
            .pages
            .lock()
            .expect("pages")
            .pop_front()
            .unwrap_or_else(|| HttpReply::ok(BOOTSTRAP_PAGE)))
    }

    async fn post_form(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        body: String,
        cookies: &CookieJar,
    ) -> Result<HttpReply, WebChatError> {
        self.posts.lock().expect("posts").push(RecordedPost {
            url: url.to_owned(),
            query: query.to_vec(),
            body,
            cookies: cookies.clone(),
        });
        Ok(self
            .replies
            .lock()
            .expect("replies")
            .pop_front()
            .expect("unexpected chat request"))
    }
}

fn chat_reply(text: &str, conversation_id: &str, response_id: &str, choice_id: &str) -> HttpReply {
    let payload = json!([null, [conversation_id, response_id], null, null, [[choice_id, [text]]]]);
    let line = json!([["wrb.fr", null, payload.to_string()]]).to_string();
    HttpReply::ok(format!(")]}}'\n\n{}\n{line}\n", line.len()))
}

fn client_with(
    transport: Arc<ScriptedTransport>,
    store: Arc<MemoryCredentialStore>,
) -> WebChatClient {
    let config = WebChatConfig::new().with_base_url("https://chat.test/");
    WebChatClient::with_transport(config, transport, Arc::new(Session::new(store)))
}

fn configured_store() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::new(CookieJar::with_auth(
        "sid-1", "sidts-1",
    )))
}

fn query_value<'a>(post: &'a RecordedPost, key: &str) -> Option<&'a str> {
    post.query
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value.as_str())
}

#[tokio::test]
async fn send_turn_bootstraps_then_posts_encoded_turn() {
    let transport = ScriptedTransport::new(Vec::new(), vec![chat_reply("4", "c1", "r1", "rc1")]);
    let client = client_with(transport.clone(), configured_store());

    let result = client
        .send_turn(&ChatTurnRequest::new("What is 2+2?"))
        .await
        .expect("turn should succeed");

    assert_eq!(result.text, "4");
    assert_eq!(result.context, ConversationContext::new("c1", "r1", "rc1"));

    assert_eq!(
        transport.gets.lock().expect("gets").as_slice(),
        ["https://chat.test/app".to_owned()]
    );
    let posts = transport.posts();
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(
        post.url,
        "https://chat.test/_/BardChatUi/data/assistant.lamda.BardFrontendService/StreamGenerate"
    );
    assert!(post.body.starts_with("f.req="));
    assert!(post.body.ends_with("&at=nonce-abc"));
    assert_eq!(query_value(post, "bl"), Some("boq_assistant-bard-web-server_test"));
    assert_eq!(query_value(post, "hl"), Some("en"));
    assert_eq!(query_value(post, "rt"), Some("c"));
    assert!(query_value(post, "_reqid")
        .and_then(|id| id.parse::<u32>().ok())
        .is_some_and(|id| id < 1_000_000));
    assert_eq!(post.cookies.get(PSID_COOKIE), Some("sid-1"));
}

#[tokio::test]
async fn nonce_is_fetched_once_across_turns() {
    let transport = ScriptedTransport::new(
        Vec::new(),
        vec![
            chat_reply("first", "c1", "r1", "rc1"),
            chat_reply("second", "c1", "r2", "rc2"),
        ],
    );
    let client = client_with(transport.clone(), configured_store());

    let first = client
        .send_turn(&ChatTurnRequest::new("one"))
        .await
        .expect("first turn");
    let second = client
        .send_turn(&ChatTurnRequest::new("two").with_context(first.context.clone()))
        .await
        .expect("second turn");

    assert_eq!(second.text, "second");
    assert_eq!(second.context, ConversationContext::new("c1", "r2", "rc2"));
    assert_eq!(transport.get_count(), 1);

    let posts = transport.posts();
    let (_, f_req) = posts[1].body.split_once("f.req=").expect("f.req");
    let f_req = urlencoding::decode(f_req.split("&at=").next().expect("at")).expect("decode");
    assert!(f_req.contains(r#"[\"c1\",\"r1\",\"rc1\"]"#));
}

#[tokio::test]
async fn missing_credentials_are_configuration_errors() {
    let transport = ScriptedTransport::new(Vec::new(), Vec::new());
    let store = Arc::new(MemoryCredentialStore::new({
        let mut jar = CookieJar::new();
        jar.insert(PSID_COOKIE, "sid-only");
        jar
    }));
    let client = client_with(transport.clone(), store);

    let error = client
        .send_turn(&ChatTurnRequest::new("hi"))
        .await
        .expect_err("credentials incomplete");

    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert!(matches!(
        error,
        WebChatError::MissingCredentials { ref missing } if missing == &vec![PSIDTS_COOKIE]
    ));
    assert_eq!(transport.get_count(), 0);
    assert!(transport.posts().is_empty());
}

#[tokio::test]
async fn unsendable_cookie_value_is_configuration_error() {
    let transport = ScriptedTransport::new(Vec::new(), Vec::new());
    let store = Arc::new(MemoryCredentialStore::new(CookieJar::with_auth(
        "sid\npasted", "sidts",
    )));
    let client = client_with(transport.clone(), store);

    let error = client
        .send_turn(&ChatTurnRequest::new("hi"))
        .await
        .expect_err("newline in cookie");

    assert_eq!(error.kind(), ErrorKind::Configuration);
    assert!(matches!(
        error,
        WebChatError::InvalidCredentials { ref names } if names == &vec![PSID_COOKIE.to_owned()]
    ));
    assert!(error
        .remediation()
        .is_some_and(|text| text.contains("chatshell credentials set")));
    assert_eq!(transport.get_count(), 0);
}

#[tokio::test]
async fn missing_nonce_is_authentication_error() {
    let transport = ScriptedTransport::new(
        vec![HttpReply::ok("<html>Sign in to continue</html>")],
        Vec::new(),
    );
    let client = client_with(transport.clone(), configured_store());

    let error = client
        .send_turn(&ChatTurnRequest::new("hi"))
        .await
        .expect_err("no nonce");

    assert_eq!(error.kind(), ErrorKind::Authentication);
    assert!(transport.posts().is_empty());
}

#[tokio::test]
async fn error_status_carries_status_text() {
    let mut reply = HttpReply::ok("");
    reply.status = StatusCode::SERVICE_UNAVAILABLE;
    let transport = ScriptedTransport::new(Vec::new(), vec![reply]);
    let client = client_with(transport, configured_store());

    let error = client
        .send_turn(&ChatTurnRequest::new("hi"))
        .await
        .expect_err("503");

    assert_eq!(error.kind(), ErrorKind::ProtocolStatus);
    assert_eq!(error.to_string(), "HTTP 503 Service Unavailable");
}

#[tokio::test]
async fn rotated_cookies_are_persisted_and_reused() {
    let store = configured_store();
    let transport = ScriptedTransport::new(
        Vec::new(),
        vec![
            chat_reply("a", "c1", "r1", "rc1")
                .with_set_cookie("__Secure-1PSIDTS=sidts-2; Domain=.chat.test; Path=/; Secure"),
            chat_reply("b", "c1", "r2", "rc2"),
        ],
    );
    let client = client_with(transport.clone(), store.clone());

    client
        .send_turn(&ChatTurnRequest::new("one"))
        .await
        .expect("first turn");
    assert_eq!(store.persist_count(), 1);
    assert_eq!(store.snapshot().get(PSIDTS_COOKIE), Some("sidts-2"));

    client
        .send_turn(&ChatTurnRequest::new("two"))
        .await
        .expect("second turn");
    assert_eq!(store.persist_count(), 1);
    assert_eq!(transport.posts()[1].cookies.get(PSIDTS_COOKIE), Some("sidts-2"));
}

#[tokio::test]
async fn auxiliary_reply_echoes_request_context() {
    let transport = ScriptedTransport::new(
        Vec::new(),
        vec![HttpReply::ok(")]}'\n\n[[\"wrb.fr\",\"ESY5D\",\"[]\"]]\n")],
    );
    let client = client_with(transport, configured_store());
    let context = ConversationContext::new("c9", "r9", "rc9");

    let result = client
        .send_turn(&ChatTurnRequest::new("hi").with_context(context.clone()))
        .await
        .expect("fallback is not an error");

    assert_eq!(result.text, "\n\n[[\"wrb.fr\",\"ESY5D\",\"[]\"]]\n");
    assert_eq!(result.context, context);
}

#[tokio::test]
async fn turn_language_overrides_config() {
    let transport = ScriptedTransport::new(Vec::new(), vec![chat_reply("hallo", "c", "r", "rc")]);
    let client = client_with(transport.clone(), configured_store());

    client
        .send_turn(&ChatTurnRequest::new("hi").with_language("de"))
        .await
        .expect("turn");

    assert_eq!(query_value(&transport.posts()[0], "hl"), Some("de"));
}

#[tokio::test]
async fn concurrent_first_turns_share_one_bootstrap() {
    let transport = ScriptedTransport::new(
        Vec::new(),
        vec![
            chat_reply("a", "c1", "r1", "rc1"),
            chat_reply("b", "c2", "r2", "rc2"),
        ],
    );
    let client = Arc::new(client_with(transport.clone(), configured_store()));

    let left = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.send_turn(&ChatTurnRequest::new("left")).await }
    });
    let right = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.send_turn(&ChatTurnRequest::new("right")).await }
    });

    left.await.expect("join").expect("left turn");
    right.await.expect("join").expect("right turn");
    assert_eq!(transport.get_count(), 1);
}
