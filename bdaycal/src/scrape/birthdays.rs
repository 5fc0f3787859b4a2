//! Month-by-month birthday listing fetch.
//!
//! The listing endpoint takes an epoch timestamp selecting a month window
//! and returns an HTML fragment embedded in a JSON payload. Twelve windows
//! starting at the current month cover a full year of birthdays.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, TimeZone};
use chrono_tz::America::Los_Angeles;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, FetchError};
use crate::locale::resolve_birthday;
use crate::markup::{decode_entities, strip_ajax_prefix};
use crate::models::Birthday;
use crate::session::Session;
use crate::tokens::TokenCache;

use super::entity::resolve_uid;

const BIRTHDAY_ASYNC_PATH: &str = "/async/birthdays/";

/// Per-person fragment in the birthday card markup: profile link, tooltip
/// date string, display name.
const BIRTHDAY_ENTRY_PATTERN: &str = concat!(
    r#"class="_43q7".*?"#,
    r#"href="https://www\.facebook\.com/(.*?)".*?"#,
    r#"data-tooltip-content="(.*?)">.*?"#,
    r#"alt="(.*?)".*?/>"#,
);

/// Fetch a year's worth of birthdays, de-duplicated by uid.
///
/// `today` anchors both the month window and the relative day-name
/// resolution. Zero records across all twelve windows is a failure, not an
/// empty success - an extraction break and an empty friend list look the
/// same here.
pub async fn fetch_all(
    session: &Session,
    tokens: &mut TokenCache,
    today: NaiveDate,
) -> Result<Vec<Birthday>, Error> {
    let mut by_uid: HashMap<String, Birthday> = HashMap::new();

    for timestamp in month_window_timestamps(today) {
        let token = tokens.auth_token(session).await?;
        let url = format!(
            "{}{}?date={timestamp}&fb_dtsg_ag={}&__a=1",
            session.base_url(),
            BIRTHDAY_ASYNC_PATH,
            urlencoding::encode(&token),
        );

        let response = session.get(&url).await.map_err(FetchError::Network)?;
        if !response.status().is_success() {
            return Err(FetchError::PageUnavailable(response.status()).into());
        }
        let body = response.text().await.map_err(FetchError::Network)?;
        let html = birthday_card_html(&body)?;

        let monthly = parse_birthday_entries(&html);
        debug!(timestamp, entries = monthly.len(), "parsed month window");

        let locale = tokens.locale(session).await?;
        for entry in monthly {
            let uid = resolve_uid(session, tokens, &entry.vanity_name).await?;

            // A birthday near a window boundary can show up twice; the
            // first occurrence wins.
            if by_uid.contains_key(&uid) {
                continue;
            }

            let (day, month) = resolve_birthday(&entry.tooltip, &entry.name, &locale, today)?;
            by_uid.insert(
                uid.clone(),
                Birthday {
                    uid,
                    name: decode_entities(&entry.name),
                    day,
                    month,
                },
            );
        }
    }

    if by_uid.is_empty() {
        return Err(FetchError::NoData.into());
    }

    info!(count = by_uid.len(), "collected birthdays");
    Ok(by_uid.into_values().collect())
}

/// One extracted triple, before uid and date resolution.
#[derive(Debug, PartialEq, Eq)]
struct RawEntry {
    vanity_name: String,
    tooltip: String,
    name: String,
}

/// Pull the birthday card HTML fragment out of the JSON envelope.
fn birthday_card_html(body: &str) -> Result<String, FetchError> {
    let json: Value = serde_json::from_str(strip_ajax_prefix(body))
        .map_err(|_| FetchError::MalformedPayload("birthday listing is not valid json"))?;

    json.get("domops")
        .and_then(|value| value.get(0))
        .and_then(|value| value.get(3))
        .and_then(|value| value.get("__html"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or(FetchError::MalformedPayload("birthday card html missing"))
}

/// Extract (vanity name, tooltip, display name) triples from the card
/// markup.
fn parse_birthday_entries(html: &str) -> Vec<RawEntry> {
    let regexp = Regex::new(BIRTHDAY_ENTRY_PATTERN).unwrap();
    regexp
        .captures_iter(html)
        .map(|captures| RawEntry {
            vanity_name: captures[1].to_string(),
            tooltip: captures[2].to_string(),
            name: captures[3].to_string(),
        })
        .collect()
}

/// Epoch timestamps for 00:00:00 on the 1st of the current month and the
/// following eleven, interpreted in the service's reference timezone.
fn month_window_timestamps(today: NaiveDate) -> Vec<i64> {
    let mut timestamps = Vec::with_capacity(12);
    let mut year = today.year();
    let mut month = today.month();

    for _ in 0..12 {
        timestamps.push(month_start_epoch(year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    timestamps
}

fn month_start_epoch(year: i32, month: u32) -> i64 {
    // Midnight on the 1st never falls in a DST gap for this zone; when a
    // fold repeats it, the earlier instant is the one the service uses.
    Los_Angeles
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .earliest()
        .map_or(0, |start| start.timestamp())
}
