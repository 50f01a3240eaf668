//! Session token storage in the `token` cookie.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

pub const SESSION_COOKIE_NAME: &str = "token";

/// Opaque token issued by the member API after a successful login.
#[derive(Debug, Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// RFC 6265 `cookie-value` without quotes: one or more `cookie-octet`s.
#[must_use]
pub fn is_cookie_value(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    value: SessionToken,
    path: String,
    http_only: bool,
    secure: bool,
    same_site: SameSite,
}

impl SessionCookie {
    /// Site-wide session cookie, unreadable from script, sent cross-site over
    /// HTTPS only. No `Max-Age`, the browser drops it with the session.
    #[must_use]
    pub fn session(token: SessionToken) -> Self {
        Self {
            name: SESSION_COOKIE_NAME.to_string(),
            value: token,
            path: "/".to_string(),
            http_only: true,
            secure: true,
            same_site: SameSite::None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &SessionToken {
        &self.value
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn http_only(&self) -> bool {
        self.http_only
    }

    #[must_use]
    pub const fn secure(&self) -> bool {
        self.secure
    }

    #[must_use]
    pub const fn same_site(&self) -> SameSite {
        self.same_site
    }

    /// Render the `Set-Cookie` header value.
    ///
    /// # Errors
    /// Returns an error if the token contains bytes not allowed in a header.
    pub fn header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={}; Path={}; SameSite={}",
            self.name,
            self.value.expose(),
            self.path,
            self.same_site.as_str()
        );
        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}

/// Cookie access for one in-flight request.
pub trait SessionStore {
    fn get(&self, name: &str) -> Option<&str>;

    fn set(&mut self, cookie: SessionCookie);

    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Request cookies plus the cookies to send back with the response.
#[derive(Debug, Default)]
pub struct CookieJar {
    values: HashMap<String, SecretString>,
    pending: Vec<SessionCookie>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every cookie from the `Cookie` request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let values = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| {
                let (key, value) = pair.trim().split_once('=')?;
                let key = key.trim();
                if key.is_empty() {
                    return None;
                }
                Some((
                    key.to_string(),
                    SecretString::from(value.trim().to_string()),
                ))
            })
            .collect();

        Self {
            values,
            pending: Vec::new(),
        }
    }

    /// Cookies set during the request, in the order they were set.
    #[must_use]
    pub fn pending(&self) -> &[SessionCookie] {
        &self.pending
    }
}

impl SessionStore for CookieJar {
    fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(ExposeSecret::expose_secret)
    }

    fn set(&mut self, cookie: SessionCookie) {
        self.values.insert(
            cookie.name().to_string(),
            SecretString::from(cookie.value().expose().to_string()),
        );
        self.pending.retain(|pending| pending.name() != cookie.name());
        self.pending.push(cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() -> Result<(), InvalidHeaderValue> {
        let cookie = SessionCookie::session(SessionToken::new("abc123"));
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value().expose(), "abc123");
        assert_eq!(cookie.path(), "/");
        assert!(cookie.http_only());
        assert!(cookie.secure());
        assert_eq!(cookie.same_site(), SameSite::None);

        let header = cookie.header_value()?;
        assert_eq!(
            header.to_str().ok(),
            Some("token=abc123; Path=/; SameSite=None; HttpOnly; Secure")
        );
        Ok(())
    }

    #[test]
    fn header_rejects_control_characters() {
        let cookie = SessionCookie::session(SessionToken::new("bad\ntoken"));
        assert!(cookie.header_value().is_err());
    }

    #[test]
    fn cookie_value_octets() {
        assert!(is_cookie_value("abc123"));
        assert!(is_cookie_value("eyJhbGciOi.J9-_~+/="));
        assert!(!is_cookie_value(""));
        assert!(!is_cookie_value("abc; Domain=evil.example"));
        assert!(!is_cookie_value("a,b"));
        assert!(!is_cookie_value("a b"));
        assert!(!is_cookie_value("\"quoted\""));
        assert!(!is_cookie_value("back\\slash"));
        assert!(!is_cookie_value("bad\ntoken"));
        assert!(!is_cookie_value("토큰"));
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = SessionToken::new("abc123");
        assert!(!format!("{token:?}").contains("abc123"));
    }

    #[test]
    fn jar_parses_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; token=abc123"));
        headers.append(COOKIE, HeaderValue::from_static("lang=ko"));
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(jar.get("token"), Some("abc123"));
        assert_eq!(jar.get("theme"), Some("dark"));
        assert_eq!(jar.get("lang"), Some("ko"));
        assert!(!jar.has("missing"));
    }

    #[test]
    fn jar_skips_malformed_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("garbage; =value; token=x"));
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(jar.get("token"), Some("x"));
        assert!(!jar.has("garbage"));
    }

    #[test]
    fn set_is_visible_and_pending() {
        let mut jar = CookieJar::new();
        assert!(!jar.has(SESSION_COOKIE_NAME));
        jar.set(SessionCookie::session(SessionToken::new("first")));
        jar.set(SessionCookie::session(SessionToken::new("second")));
        assert_eq!(jar.get(SESSION_COOKIE_NAME), Some("second"));
        assert_eq!(jar.pending().len(), 1);
        assert_eq!(jar.pending()[0].value().expose(), "second");
    }
}
