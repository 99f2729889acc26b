use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, StatusCode};

use crate::config::WebChatConfig;
use crate::cookies::CookieJar;
use crate::error::WebChatError;
use crate::headers::{default_headers, FORM_CONTENT_TYPE};

/// Status, rotated cookies and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: StatusCode,
    /// Raw `Set-Cookie` header values, in response order.
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl HttpReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            set_cookies: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_set_cookie(mut self, set_cookie: impl Into<String>) -> Self {
        self.set_cookies.push(set_cookie.into());
        self
    }
}

/// The two HTTP calls the protocol needs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET an HTML page with the session cookies.
    async fn get(&self, url: &str, cookies: &CookieJar) -> Result<HttpReply, WebChatError>;

    /// POST a url-encoded form body with the session cookies.
    async fn post_form(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        body: String,
        cookies: &CookieJar,
    ) -> Result<HttpReply, WebChatError>;
}

/// [`Transport`] over a shared `reqwest` client.
#[derive(Debug)]
pub struct ReqwestTransport {
    http: Client,
    headers: HeaderMap,
}

impl ReqwestTransport {
    pub fn new(config: &WebChatConfig) -> Result<Self, WebChatError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|error| WebChatError::HttpClientBuild(error.to_string()))?;

        Ok(Self {
            http,
            headers: header_map(config)?,
        })
    }

    fn with_cookies(
        &self,
        request: RequestBuilder,
        cookies: &CookieJar,
    ) -> Result<RequestBuilder, WebChatError> {
        let cookie = HeaderValue::from_str(&cookies.header_value()).map_err(|_| {
            WebChatError::InvalidCredentials {
                names: cookies.unsendable_cookies(),
            }
        })?;
        Ok(request.headers(self.headers.clone()).header(COOKIE, cookie))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, cookies: &CookieJar) -> Result<HttpReply, WebChatError> {
        let request = self.with_cookies(self.http.get(url), cookies)?;
        read_reply(request.send().await?).await
    }

    async fn post_form(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        body: String,
        cookies: &CookieJar,
    ) -> Result<HttpReply, WebChatError> {
        let request = self
            .with_cookies(self.http.post(url), cookies)?
            .query(query)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);
        read_reply(request.send().await?).await
    }
}

fn header_map(config: &WebChatConfig) -> Result<HeaderMap, WebChatError> {
    let mut out = HeaderMap::new();
    for (key, value) in default_headers(config) {
        out.insert(
            HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| WebChatError::InvalidHeader(format!("invalid header key: {key}")))?,
            HeaderValue::from_str(&value)
                .map_err(|_| WebChatError::InvalidHeader(format!("invalid header value for {key}")))?,
        );
    }
    Ok(out)
}

async fn read_reply(response: reqwest::Response) -> Result<HttpReply, WebChatError> {
    let status = response.status();
    let set_cookies = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
        .collect();
    let body = response.text().await?;

    Ok(HttpReply {
        status,
        set_cookies,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_lowercases_extra_headers() {
        let config = WebChatConfig::new().insert_header("X-Debug", " on ");
        let headers = header_map(&config).expect("headers");
        assert_eq!(headers.get("x-debug").and_then(|v| v.to_str().ok()), Some("on"));
        assert_eq!(headers.get("x-same-domain").and_then(|v| v.to_str().ok()), Some("1"));
    }

    #[test]
    fn unsendable_cookie_is_a_credentials_error() {
        let transport = ReqwestTransport::new(&WebChatConfig::new()).expect("transport");
        let cookies = CookieJar::with_auth("sid\npasted", "sidts");

        let error = transport
            .with_cookies(transport.http.get("https://chat.test/app"), &cookies)
            .expect_err("newline cannot be sent");
        assert!(matches!(
            error,
            WebChatError::InvalidCredentials { ref names } if names == &vec![crate::cookies::PSID_COOKIE.to_string()]
        ));
    }

    #[test]
    fn header_map_rejects_invalid_values() {
        let config = WebChatConfig::new().insert_header("x-bad", "line\nbreak");
        assert!(matches!(
            header_map(&config),
            Err(WebChatError::InvalidHeader(_))
        ));
    }
}
