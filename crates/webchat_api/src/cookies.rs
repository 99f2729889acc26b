use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Primary auth cookie.
pub const PSID_COOKIE: &str = "__Secure-1PSID";
/// Rotating companion of [`PSID_COOKIE`].
pub const PSIDTS_COOKIE: &str = "__Secure-1PSIDTS";

/// Cookies that must be present before any call.
pub const AUTH_COOKIES: [&str; 2] = [PSID_COOKIE, PSIDTS_COOKIE];

/// Session cookies by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar(BTreeMap<String, String>);

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jar holding the two auth cookies.
    pub fn with_auth(psid: impl Into<String>, psidts: impl Into<String>) -> Self {
        let mut jar = Self::new();
        jar.insert(PSID_COOKIE, psid);
        jar.insert(PSIDTS_COOKIE, psidts);
        jar
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Store a value; returns whether the jar changed.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        let value = value.into();
        if self.0.get(&name) == Some(&value) {
            return false;
        }
        self.0.insert(name, value);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Auth cookies that are absent or blank.
    pub fn missing_auth_cookies(&self) -> Vec<&'static str> {
        AUTH_COOKIES
            .into_iter()
            .filter(|name| self.get(name).map_or(true, |value| value.trim().is_empty()))
            .collect()
    }

    /// Names of cookies whose name or value cannot go into a `Cookie` header.
    pub fn unsendable_cookies(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(name, value)| !is_sendable_cookie_part(name) || !is_sendable_cookie_part(value))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// `Cookie` request header value, e.g. `a=1; b=2`.
    pub fn header_value(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Apply `Set-Cookie` header values; returns whether any stored value changed.
    pub fn apply_set_cookies<I, S>(&mut self, set_cookies: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut changed = false;
        for line in set_cookies {
            if let Some((name, value)) = parse_set_cookie(line.as_ref()) {
                changed |= self.insert(name, value);
            }
        }
        changed
    }
}

impl FromIterator<(String, String)> for CookieJar {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Visible ASCII without `;`, the only bytes a `Cookie` header pair may carry.
pub fn is_sendable_cookie_part(part: &str) -> bool {
    part.bytes()
        .all(|byte| (0x20..0x7f).contains(&byte) && byte != b';')
}

/// Name and value of one `Set-Cookie` header; attributes are ignored.
pub fn parse_set_cookie(line: &str) -> Option<(&str, &str)> {
    let pair = line.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    Some((name, value.trim().trim_matches('"')))
}
