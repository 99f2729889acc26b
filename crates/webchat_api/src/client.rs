use std::sync::Arc;

use crate::codec::{decode_response, encode_request, next_request_id, request_query};
use crate::config::WebChatConfig;
use crate::credentials::CredentialStore;
use crate::error::WebChatError;
use crate::payload::{ChatTurnRequest, ChatTurnResult};
use crate::session::Session;
use crate::transport::{ReqwestTransport, Transport};
use crate::url::{bootstrap_url, stream_generate_url};

/// Chat web RPC client: one HTTP POST per turn over a shared [`Session`].
pub struct WebChatClient {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
    config: WebChatConfig,
}

impl std::fmt::Debug for WebChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebChatClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WebChatClient {
    /// Client over `reqwest` with a fresh session backed by `store`.
    pub fn new(config: WebChatConfig, store: Arc<dyn CredentialStore>) -> Result<Self, WebChatError> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(
            config,
            transport,
            Arc::new(Session::new(store)),
        ))
    }

    pub fn with_transport(
        config: WebChatConfig,
        transport: Arc<dyn Transport>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            transport,
            session,
            config,
        }
    }

    pub fn config(&self) -> &WebChatConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Send one chat turn and return the reply text with continuation ids.
    ///
    /// Ids the reply does not carry are echoed from `turn`. No retries.
    pub async fn send_turn(&self, turn: &ChatTurnRequest) -> Result<ChatTurnResult, WebChatError> {
        let tokens = self
            .session
            .ensure_tokens(self.transport.as_ref(), &bootstrap_url(&self.config.base_url))
            .await?;
        let cookies = self.session.cookies().await?;

        let request_id = next_request_id();
        let query = request_query(
            &tokens.backend_version,
            self.config.language_for(turn.language.as_deref()),
            request_id,
        );
        let body = encode_request(turn, &tokens.nonce);

        tracing::debug!(
            request_id,
            fresh = turn.context.is_fresh(),
            "sending chat turn"
        );
        let reply = self
            .transport
            .post_form(
                &stream_generate_url(&self.config.base_url),
                &query,
                body,
                &cookies,
            )
            .await?;
        self.session.absorb_set_cookies(&reply.set_cookies).await;

        if !reply.status.is_success() {
            return Err(WebChatError::status(reply.status));
        }

        let decoded = decode_response(&reply.body);
        if decoded.fallback {
            tracing::warn!(request_id, "chat reply had no candidate text; returning raw body");
        }

        Ok(ChatTurnResult {
            text: decoded.text,
            context: turn.context.merged_with(decoded.context),
        })
    }
}
