//! Per-client session state: auth cookies plus the scraped nonce/version.
//!
//! The nonce is fetched once per session and kept until [`Session::invalidate`].
//! Cookie rotations are written back through the [`CredentialStore`] before the
//! call that observed them returns. Both steps run under one async mutex, so
//! concurrent callers never bootstrap twice or interleave cookie writes.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bootstrap::{scrape_tokens, BootstrapTokens};
use crate::cookies::CookieJar;
use crate::credentials::CredentialStore;
use crate::error::WebChatError;
use crate::transport::Transport;

pub struct Session {
    store: Arc<dyn CredentialStore>,
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    cookies: Option<CookieJar>,
    tokens: Option<BootstrapTokens>,
    dirty: bool,
}

impl Session {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Current cookies, loaded from the store on first use.
    ///
    /// Fails with [`WebChatError::MissingCredentials`] until both auth cookies
    /// are configured.
    pub async fn cookies(&self) -> Result<CookieJar, WebChatError> {
        let mut state = self.state.lock().await;
        Ok(loaded_cookies(&mut state, self.store.as_ref())?.clone())
    }

    /// Cached tokens, or a single bootstrap fetch when none are cached yet.
    pub async fn ensure_tokens(
        &self,
        transport: &dyn Transport,
        bootstrap_url: &str,
    ) -> Result<BootstrapTokens, WebChatError> {
        let mut state = self.state.lock().await;
        if let Some(tokens) = &state.tokens {
            return Ok(tokens.clone());
        }

        let cookies = loaded_cookies(&mut state, self.store.as_ref())?.clone();
        tracing::debug!(url = bootstrap_url, "fetching session bootstrap page");
        let reply = transport.get(bootstrap_url, &cookies).await?;
        self.absorb_locked(&mut state, &reply.set_cookies).await;

        if !reply.status.is_success() {
            return Err(WebChatError::status(reply.status));
        }

        let tokens = scrape_tokens(&reply.body)?;
        tracing::debug!(backend_version = %tokens.backend_version, "session bootstrapped");
        state.tokens = Some(tokens.clone());
        Ok(tokens)
    }

    /// Apply `Set-Cookie` values from a response; returns whether the jar changed.
    pub async fn absorb_set_cookies(&self, set_cookies: &[String]) -> bool {
        let mut state = self.state.lock().await;
        self.absorb_locked(&mut state, set_cookies).await
    }

    /// Drop the cached nonce/version; the next call bootstraps again.
    pub async fn invalidate(&self) {
        self.state.lock().await.tokens = None;
    }

    pub async fn has_tokens(&self) -> bool {
        self.state.lock().await.tokens.is_some()
    }

    async fn absorb_locked(&self, state: &mut SessionState, set_cookies: &[String]) -> bool {
        let Some(jar) = state.cookies.as_mut() else {
            return false;
        };

        let changed = jar.apply_set_cookies(set_cookies);
        if changed {
            tracing::debug!("session cookies rotated");
            state.dirty = true;
        }

        // A failed write stays dirty and is retried after the next response.
        // Stores may do blocking file I/O, so the write runs on the blocking pool.
        if state.dirty {
            let store = Arc::clone(&self.store);
            let snapshot = jar.clone();
            match tokio::task::spawn_blocking(move || store.persist(&snapshot)).await {
                Ok(Ok(())) => state.dirty = false,
                Ok(Err(error)) => {
                    tracing::warn!(%error, "failed to persist rotated session cookies")
                }
                Err(error) => tracing::warn!(%error, "cookie persist task did not complete"),
            }
        }

        changed
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// Incomplete or unsendable credentials are not cached, so a later call re-reads the store.
fn loaded_cookies<'a>(
    state: &'a mut SessionState,
    store: &dyn CredentialStore,
) -> Result<&'a mut CookieJar, WebChatError> {
    if state.cookies.is_none() {
        let jar = store
            .credentials()
            .map_err(WebChatError::CredentialStore)?;
        let missing = jar.missing_auth_cookies();
        if !missing.is_empty() {
            return Err(WebChatError::MissingCredentials { missing });
        }
        let names = jar.unsendable_cookies();
        if !names.is_empty() {
            return Err(WebChatError::InvalidCredentials { names });
        }
        state.cookies = Some(jar);
    }

    Ok(state.cookies.get_or_insert_with(CookieJar::new))
}
