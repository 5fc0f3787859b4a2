//! Per-request session state: cookie jar, user agent, base URLs.
//!
//! A `Session` is created at request start, mutated only during the login
//! handshake, and dropped at request end. It is never shared across
//! requests - the cached token/locale for a session live in
//! [`crate::tokens::TokenCache`], which has the same lifecycle.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::{Client, Response, Url};

const FACEBOOK_BASE_URL: &str = "https://www.facebook.com";
const FACEBOOK_MOBILE_BASE_URL: &str = "https://m.facebook.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/74.0.3729.169 Safari/537.36";

/// Ephemeral credential pair; single-request scope, never persisted.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// One authenticated browsing session against the target service.
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    base_url: String,
    mobile_base_url: String,
}

impl Session {
    /// Create a session against the production endpoints.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_base_urls(FACEBOOK_BASE_URL, FACEBOOK_MOBILE_BASE_URL)
    }

    /// Create a session against custom endpoints (tests point this at a
    /// local mock server).
    pub fn with_base_urls(base_url: &str, mobile_base_url: &str) -> Result<Self, reqwest::Error> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(Self {
            client,
            jar,
            base_url: base_url.trim_end_matches('/').to_string(),
            mobile_base_url: mobile_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn mobile_base_url(&self) -> &str {
        &self.mobile_base_url
    }

    /// GET a page with the session's cookies and user agent.
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        self.client.get(url).send().await
    }

    /// Submit a form with the session's cookies and user agent.
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<Response, reqwest::Error> {
        self.client.post(url).form(fields).send().await
    }

    /// Add the anti-bot value as both `datr` and `_js_datr` cookies scoped
    /// to the service domain, so every later request (mobile host included)
    /// carries them.
    pub fn inject_session_cookies(&self, value: &str) {
        // The login page was already fetched from this URL, so it parses.
        let Ok(origin) = Url::parse(&self.base_url) else {
            return;
        };

        let host = origin.host_str().unwrap_or_default();
        let host_only = host.parse::<std::net::IpAddr>().is_ok() || !host.contains('.');

        for name in ["datr", "_js_datr"] {
            let cookie = if host_only {
                format!("{name}={value}; Path=/")
            } else {
                // Registrable domain with leading dot covers www.* and m.*
                let domain = host.trim_start_matches("www.");
                format!("{name}={value}; Domain=.{domain}; Path=/")
            };
            self.jar.add_cookie_str(&cookie, &origin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_are_trimmed() {
        let session = Session::with_base_urls("http://127.0.0.1:9/", "http://127.0.0.1:9/").unwrap();
        assert_eq!(session.base_url(), "http://127.0.0.1:9");
        assert_eq!(session.mobile_base_url(), "http://127.0.0.1:9");
    }

    #[test]
    fn cookie_injection_tolerates_ip_hosts() {
        let session = Session::with_base_urls("http://127.0.0.1:9", "http://127.0.0.1:9").unwrap();
        // Host-only cookies for an IP origin must not panic or reject.
        session.inject_session_cookies("abc123");
    }
}
