//! Login handshake against the target service.
//!
//! Four steps, each a distinct failure point:
//! 1. Fetch the login page and scrape the anti-bot cookie value out of the
//!    embedded script.
//! 2. Inject that value as `datr`/`_js_datr` cookies and re-fetch the page.
//! 3. Submit the login form with its hidden fields plus the credentials.
//! 4. Scan the response for the rejection and checkpoint markers; absence
//!    of both is success - the service gives no positive confirmation.

use regex::Regex;
use tracing::debug;

use crate::error::AuthError;
use crate::session::{Credentials, Session};

const LOGIN_PATH: &str = "/login.php";

/// The anti-bot value appears as a quoted pair in an inline script.
const DATR_TOKEN_PATTERN: &str = r#""_js_datr","(.*?)""#;

/// Rejected credentials bounce back to the canonical login page.
const CANONICAL_LOGIN_PATTERN: &str = r#"<link[^>]+href="https://www\.facebook\.com/login/""#;

/// A security checkpoint renders its own submit button.
const CHECKPOINT_MARKER: &str = r#"id="checkpointSubmitButton""#;

/// Authenticate the session. On success the session's cookie jar holds the
/// logged-in state; on failure the session is unusable.
pub async fn authenticate(
    session: &Session,
    credentials: &Credentials,
) -> Result<(), AuthError> {
    let login_url = format!("{}{}", session.base_url(), LOGIN_PATH);

    // Step 1: anti-bot token from the plain login page.
    let response = session.get(&login_url).await?;
    if !response.status().is_success() {
        return Err(AuthError::PageUnavailable(response.status()));
    }
    let body = response.text().await?;
    let datr = extract_datr_token(&body).ok_or(AuthError::TokenNotFound)?;

    // Step 2: re-fetch under the new cookie state.
    session.inject_session_cookies(&datr);
    let response = session.get(&login_url).await?;
    if !response.status().is_success() {
        return Err(AuthError::PageUnavailable(response.status()));
    }
    let body = response.text().await?;

    // Step 3: submit the login form.
    let form = login_form_block(&body).ok_or(AuthError::LoginFormMissing)?;
    let mut fields = hidden_fields(form);
    fields.push(("email".to_string(), credentials.email.clone()));
    fields.push(("pass".to_string(), credentials.password.clone()));

    let action = form_action(form)
        .map(|action| resolve_action(session.base_url(), &action))
        .unwrap_or_else(|| login_url.clone());
    debug!(action = %action, field_count = fields.len(), "submitting login form");

    let response = session.post_form(&action, &fields).await?;
    if !response.status().is_success() {
        return Err(AuthError::PageUnavailable(response.status()));
    }
    let body = response.text().await?;

    // Step 4: failure markers.
    let canonical = Regex::new(CANONICAL_LOGIN_PATTERN).unwrap();
    if canonical.is_match(&body) {
        return Err(AuthError::LoginRejected);
    }
    if body.contains(CHECKPOINT_MARKER) {
        return Err(AuthError::CheckpointRequired);
    }

    Ok(())
}

/// Scrape the anti-bot cookie value embedded in the login page markup.
fn extract_datr_token(body: &str) -> Option<String> {
    let regexp = Regex::new(DATR_TOKEN_PATTERN).unwrap();
    regexp
        .captures(body)
        .map(|captures| captures[1].to_string())
}

/// Locate the login form block in the page markup.
fn login_form_block(body: &str) -> Option<&str> {
    let regexp = Regex::new(r#"(?s)<form[^>]*id="login_form".*?</form>"#).unwrap();
    regexp.find(body).map(|found| found.as_str())
}

/// Extract the form's action attribute, if present.
fn form_action(form: &str) -> Option<String> {
    let regexp = Regex::new(r#"<form[^>]*action="([^"]*)""#).unwrap();
    regexp
        .captures(form)
        .map(|captures| captures[1].to_string())
}

/// Collect the form's hidden input fields as name/value pairs.
fn hidden_fields(form: &str) -> Vec<(String, String)> {
    let input = Regex::new(r"<input[^>]*>").unwrap();
    let type_attr = Regex::new(r#"type="([^"]*)""#).unwrap();
    let name_attr = Regex::new(r#"name="([^"]*)""#).unwrap();
    let value_attr = Regex::new(r#"value="([^"]*)""#).unwrap();

    let mut fields = Vec::new();
    for tag in input.find_iter(form) {
        let tag = tag.as_str();
        let kind = type_attr.captures(tag).map(|captures| captures[1].to_string());
        if kind.as_deref() != Some("hidden") {
            continue;
        }
        let Some(name) = name_attr.captures(tag).map(|captures| captures[1].to_string()) else {
            continue;
        };
        let value = value_attr
            .captures(tag)
            .map(|captures| captures[1].to_string())
            .unwrap_or_default();
        fields.push((name, value));
    }
    fields
}

/// Resolve a form action against the session's base URL.
fn resolve_action(base_url: &str, action: &str) -> String {
    if action.starts_with("http://") || action.starts_with("https://") {
        action.to_string()
    } else if action.starts_with('/') {
        format!("{base_url}{action}")
    } else {
        format!("{base_url}/{action}")
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const LOGIN_PAGE: &str = concat!(
        r#"<html><head><script>["_js_datr","token-value-123"]</script></head>"#,
        r#"<body><form id="login_form" action="/login/submit" method="post">"#,
        r#"<input type="hidden" name="lsd" value="AVqP-3Cw">"#,
        r#"<input type="hidden" name="jazoest" value="2764">"#,
        r#"<input type="text" name="email" id="email">"#,
        r#"<input type="password" name="pass" id="pass">"#,
        r#"</form></body></html>"#,
    );

    fn credentials() -> Credentials {
        Credentials {
            email: "user@example.com".to_string(),
            password: "hunter2".to_string(),
        }
    }

    async fn mock_login_page(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/login.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn successful_login_submits_hidden_and_credential_fields() {
        let server = MockServer::start().await;
        mock_login_page(&server).await;
        Mock::given(method("POST"))
            .and(path("/login/submit"))
            .and(body_string_contains("lsd=AVqP-3Cw"))
            .and(body_string_contains("email=user%40example.com"))
            .and(body_string_contains("pass=hunter2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>home</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::with_base_urls(&server.uri(), &server.uri()).unwrap();
        authenticate(&session, &credentials()).await.unwrap();
    }

    #[tokio::test]
    async fn missing_token_fails_early() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>no token</html>"))
            .mount(&server)
            .await;

        let session = Session::with_base_urls(&server.uri(), &server.uri()).unwrap();
        let err = authenticate(&session, &credentials()).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenNotFound));
    }

    #[tokio::test]
    async fn unavailable_login_page_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login.php"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let session = Session::with_base_urls(&server.uri(), &server.uri()).unwrap();
        let err = authenticate(&session, &credentials()).await.unwrap_err();
        assert!(matches!(err, AuthError::PageUnavailable(_)));
    }

    #[tokio::test]
    async fn canonical_login_link_means_rejected() {
        let server = MockServer::start().await;
        mock_login_page(&server).await;
        let rejected = concat!(
            r#"<html><head><link rel="canonical" "#,
            r#"href="https://www.facebook.com/login/"></head></html>"#,
        );
        Mock::given(method("POST"))
            .and(path("/login/submit"))
            .respond_with(ResponseTemplate::new(200).set_body_string(rejected))
            .mount(&server)
            .await;

        let session = Session::with_base_urls(&server.uri(), &server.uri()).unwrap();
        let err = authenticate(&session, &credentials()).await.unwrap_err();
        assert!(matches!(err, AuthError::LoginRejected));
    }

    #[tokio::test]
    async fn checkpoint_button_means_checkpoint() {
        let server = MockServer::start().await;
        mock_login_page(&server).await;
        let checkpoint =
            r#"<html><body><button id="checkpointSubmitButton">Continue</button></body></html>"#;
        Mock::given(method("POST"))
            .and(path("/login/submit"))
            .respond_with(ResponseTemplate::new(200).set_body_string(checkpoint))
            .mount(&server)
            .await;

        let session = Session::with_base_urls(&server.uri(), &server.uri()).unwrap();
        let err = authenticate(&session, &credentials()).await.unwrap_err();
        assert!(matches!(err, AuthError::CheckpointRequired));
    }

    #[test]
    fn datr_token_is_extracted() {
        assert_eq!(
            extract_datr_token(r#"["_js_datr","AbC123"]"#).as_deref(),
            Some("AbC123")
        );
        assert_eq!(extract_datr_token("nothing here"), None);
    }

    #[test]
    fn hidden_fields_skip_visible_inputs() {
        let fields = hidden_fields(LOGIN_PAGE);
        assert_eq!(
            fields,
            vec![
                ("lsd".to_string(), "AVqP-3Cw".to_string()),
                ("jazoest".to_string(), "2764".to_string()),
            ]
        );
    }

    #[test]
    fn relative_actions_resolve_against_the_base() {
        assert_eq!(
            resolve_action("https://example.com", "/login/submit"),
            "https://example.com/login/submit"
        );
        assert_eq!(
            resolve_action("https://example.com", "https://other.test/x"),
            "https://other.test/x"
        );
    }
}
