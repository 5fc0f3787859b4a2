//! Per-session cache of the async authorization token and account locale.
//!
//! Both values are fetched lazily, once per session. The cache is a plain
//! struct owned by the request alongside its `Session` - never process
//! global, since the token is only valid in combination with that
//! session's cookies.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::markup::strip_ajax_prefix;
use crate::session::Session;

/// The async token is embedded in the birthday events page.
const BIRTHDAY_EVENT_PAGE_PATH: &str = "/events/birthdays/";

/// Token fragment shape: `{"token":"...","async_get_token":"<value>"}`.
const ASYNC_TOKEN_PATTERN: &str = r#"\{"token":".*?","async_get_token":"(.*?)"\}"#;

/// The account locale lives in the language settings payload.
const LOCALE_SETTINGS_PATH: &str = "/ajax/settings/language/account.php";

/// Region-qualified locale identifier, e.g. `en_US`.
const LOCALE_PATTERN: &str = r"^[a-z]{2}_[A-Z]{2}$";

/// Write-once cache with the same lifecycle as its session.
#[derive(Debug, Default)]
pub struct TokenCache {
    async_token: Option<String>,
    locale: Option<String>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The CSRF-style authorization token required by every async
    /// endpoint. Fetched once, then memoized.
    pub async fn auth_token(&mut self, session: &Session) -> Result<String, FetchError> {
        if let Some(token) = &self.async_token {
            return Ok(token.clone());
        }

        let url = format!("{}{}", session.base_url(), BIRTHDAY_EVENT_PAGE_PATH);
        let response = session.get(&url).await?;
        if !response.status().is_success() {
            return Err(FetchError::TokenExtractionFailed);
        }
        let body = response.text().await?;

        let regexp = Regex::new(ASYNC_TOKEN_PATTERN).unwrap();
        let mut matches = regexp.captures_iter(&body);
        let token = match (matches.next(), matches.next()) {
            // The pattern must match exactly once.
            (Some(captures), None) => captures[1].to_string(),
            _ => return Err(FetchError::TokenExtractionFailed),
        };

        debug!("cached async authorization token");
        self.async_token = Some(token.clone());
        Ok(token)
    }

    /// The account's display locale, e.g. `en_US`. Fetched once, then
    /// memoized.
    pub async fn locale(&mut self, session: &Session) -> Result<String, FetchError> {
        if let Some(locale) = &self.locale {
            return Ok(locale.clone());
        }

        let token = self.auth_token(session).await?;
        let url = format!(
            "{}{}?fb_dtsg_ag={}&__a=1",
            session.base_url(),
            LOCALE_SETTINGS_PATH,
            urlencoding::encode(&token),
        );
        let response = session.get(&url).await?;
        if !response.status().is_success() {
            return Err(FetchError::PageUnavailable(response.status()));
        }
        let body = response.text().await?;

        let json: Value = serde_json::from_str(strip_ajax_prefix(&body))
            .map_err(|_| FetchError::MalformedPayload("language settings are not valid json"))?;
        let locale = json
            .get("jsmods")
            .and_then(|value| value.get("require"))
            .and_then(|value| value.get(0))
            .and_then(|value| value.get(3))
            .and_then(|value| value.get(1))
            .and_then(|value| value.get("currentLocale"))
            .and_then(Value::as_str)
            .ok_or(FetchError::MalformedPayload("currentLocale missing"))?;

        let regexp = Regex::new(LOCALE_PATTERN).unwrap();
        if !regexp.is_match(locale) {
            return Err(FetchError::UnsupportedLocaleFormat(locale.to_string()));
        }

        debug!(locale, "cached account locale");
        self.locale = Some(locale.to_string());
        Ok(locale.to_string())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const TOKEN_PAGE: &str =
        r#"<script>{"token":"abc","async_get_token":"AG-token-1"}</script>"#;

    async fn mock_token_page(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(BIRTHDAY_EVENT_PAGE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN_PAGE))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn token_is_fetched_once_and_memoized() {
        let server = MockServer::start().await;
        mock_token_page(&server).await;

        let session = Session::with_base_urls(&server.uri(), &server.uri()).unwrap();
        let mut cache = TokenCache::new();
        assert_eq!(cache.auth_token(&session).await.unwrap(), "AG-token-1");
        // Second call must hit the cache; the mock expects one request.
        assert_eq!(cache.auth_token(&session).await.unwrap(), "AG-token-1");
    }

    #[tokio::test]
    async fn missing_token_pattern_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(BIRTHDAY_EVENT_PAGE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>plain</html>"))
            .mount(&server)
            .await;

        let session = Session::with_base_urls(&server.uri(), &server.uri()).unwrap();
        let mut cache = TokenCache::new();
        let err = cache.auth_token(&session).await.unwrap_err();
        assert!(matches!(err, FetchError::TokenExtractionFailed));
    }

    #[tokio::test]
    async fn locale_is_parsed_from_the_wrapped_payload() {
        let server = MockServer::start().await;
        mock_token_page(&server).await;
        let payload = concat!(
            "for (;;);",
            r#"{"jsmods":{"require":[[0,0,0,[0,{"currentLocale":"en_US"}]]]}}"#,
        );
        Mock::given(method("GET"))
            .and(path(LOCALE_SETTINGS_PATH))
            .and(query_param("fb_dtsg_ag", "AG-token-1"))
            .and(query_param("__a", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(payload))
            .mount(&server)
            .await;

        let session = Session::with_base_urls(&server.uri(), &server.uri()).unwrap();
        let mut cache = TokenCache::new();
        assert_eq!(cache.locale(&session).await.unwrap(), "en_US");
        assert_eq!(cache.locale(&session).await.unwrap(), "en_US");
    }

    #[tokio::test]
    async fn malformed_locale_identifier_is_rejected() {
        let server = MockServer::start().await;
        mock_token_page(&server).await;
        let payload = concat!(
            "for (;;);",
            r#"{"jsmods":{"require":[[0,0,0,[0,{"currentLocale":"english"}]]]}}"#,
        );
        Mock::given(method("GET"))
            .and(path(LOCALE_SETTINGS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(payload))
            .mount(&server)
            .await;

        let session = Session::with_base_urls(&server.uri(), &server.uri()).unwrap();
        let mut cache = TokenCache::new();
        let err = cache.locale(&session).await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedLocaleFormat(_)));
    }
}
