//! Vanity-name to entity-id resolution.
//!
//! Two tiers: the composer query endpoint (fast, but only finds people the
//! account can address), then a scrape of the mobile profile page. Tier-one
//! failures of any kind are swallowed and treated as "no match" since tier
//! two is the intended fallback; a tier-two failure is terminal.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{EntityResolutionError, Error, FetchError};
use crate::markup::strip_ajax_prefix;
use crate::session::Session;
use crate::tokens::TokenCache;

const COMPOSER_QUERY_PATH: &str = "/ajax/mercury/composer_query.php";

/// Numeric entity id embedded in the mobile profile page markup.
const PROFILE_ENTITY_ID_PATTERN: &str = r"entity_id:(\d+),ef_page:";

/// Profile links without a custom vanity name carry the id directly.
const DIRECT_ID_PREFIX: &str = "profile.php?id=";

/// Resolve a vanity name to the service's stable numeric identifier.
pub async fn resolve_uid(
    session: &Session,
    tokens: &mut TokenCache,
    vanity_name: &str,
) -> Result<String, Error> {
    // No custom vanity name: the id is right there, no network needed.
    if let Some(uid) = vanity_name.strip_prefix(DIRECT_ID_PREFIX) {
        return Ok(uid.to_string());
    }

    if let Some(uid) = composer_query_uid(session, tokens, vanity_name).await? {
        return Ok(uid);
    }

    debug!(vanity_name, "composer query missed, scraping profile page");
    if let Some(uid) = profile_page_uid(session, vanity_name).await {
        return Ok(uid);
    }

    Err(Error::Entity(EntityResolutionError {
        vanity_name: vanity_name.to_string(),
    }))
}

/// Tier one: scan composer query entries for a person whose alias matches
/// the vanity name exactly. Network and parse errors yield no entries.
async fn composer_query_uid(
    session: &Session,
    tokens: &mut TokenCache,
    vanity_name: &str,
) -> Result<Option<String>, FetchError> {
    let token = tokens.auth_token(session).await?;
    let url = format!(
        "{}{}?value={}&fb_dtsg_ag={}&__a=1",
        session.base_url(),
        COMPOSER_QUERY_PATH,
        urlencoding::encode(vanity_name),
        urlencoding::encode(&token),
    );

    for entry in composer_query_entries(session, &url).await {
        // Skip commerce pages and other non-person render types.
        let vertical = entry.get("vertical_type").and_then(Value::as_str);
        let render = entry.get("render_type").and_then(Value::as_str);
        if vertical != Some("USER") && !matches!(render, Some("friend" | "non_friend")) {
            continue;
        }

        if entry.get("alias").and_then(Value::as_str) == Some(vanity_name) {
            if let Some(uid) = entry.get("uid").map(uid_string) {
                return Ok(Some(uid));
            }
        }
    }

    Ok(None)
}

/// Fetch and decode the composer query entry list; any failure is an empty
/// list by design of the two-tier lookup.
async fn composer_query_entries(session: &Session, url: &str) -> Vec<Value> {
    let Ok(response) = session.get(url).await else {
        return Vec::new();
    };
    if !response.status().is_success() {
        return Vec::new();
    }
    let Ok(body) = response.text().await else {
        return Vec::new();
    };

    serde_json::from_str::<Value>(strip_ajax_prefix(&body))
        .ok()
        .and_then(|json| {
            json.get("payload")
                .and_then(|payload| payload.get("entries"))
                .and_then(Value::as_array)
                .cloned()
        })
        .unwrap_or_default()
}

/// Tier two: scrape the numeric entity id out of the mobile profile page.
async fn profile_page_uid(session: &Session, vanity_name: &str) -> Option<String> {
    let url = format!("{}/{vanity_name}", session.mobile_base_url());
    let response = session.get(&url).await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body = response.text().await.ok()?;

    let regexp = Regex::new(PROFILE_ENTITY_ID_PATTERN).unwrap();
    regexp
        .captures(&body)
        .map(|captures| captures[1].to_string())
}

/// Entry uids arrive as either JSON numbers or strings.
fn uid_string(value: &Value) -> String {
    match value {
        Value::String(uid) => uid.clone(),
        other => other.to_string(),
    }
}
