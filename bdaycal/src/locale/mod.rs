//! Locale-aware resolution of birthday tooltip strings.
//!
//! Tooltips carry a day/month in the account locale's date format, except
//! for birthdays in the coming week, which render as weekday names (today's
//! own birthday still renders as a date). Resolution therefore tries the
//! locale's static pattern first and falls back to a weekday-name offset
//! table.

mod dayname;
mod formats;

use chrono::{Datelike, Days, NaiveDate};

use crate::error::DateParseError;
use crate::markup;

/// Artifacts stripped from tooltip text before parsing: brackets,
/// directionality marks, and the Armenian name-suffix particle.
const STRIP_ARTIFACTS: &[&str] = &["(", ")", "&#x200f;", "&#x200e;", "&#x55d;"];

/// Resolve a tooltip string to a `(day, month)` pair.
///
/// `today` anchors the weekday-name fallback; the tooltip itself never
/// encodes a year.
pub fn resolve_birthday(
    tooltip: &str,
    person_name: &str,
    locale: &str,
    today: NaiveDate,
) -> Result<(u32, u32), DateParseError> {
    let cleaned = strip_tooltip(tooltip, person_name);

    let Some(pattern) = formats::date_format(locale) else {
        return Err(DateParseError::UnsupportedLocale(locale.to_string()));
    };

    if let Some(day_month) = parse_day_month(&cleaned, pattern) {
        return Ok(day_month);
    }

    // Not a date, so it should be a weekday name for the coming week.
    let table = dayname::offset_table(locale, today)?;
    let day_name = markup::decode_entities(&cleaned).trim().to_lowercase();
    if let Some(&offset) = table.get(day_name.as_str()) {
        let date = today + Days::new(u64::from(offset));
        return Ok((date.day(), date.month()));
    }

    Err(DateParseError::UnrecognizedDayName(cleaned))
}

/// Remove the person's name and the fixed artifact set, leaving only the
/// day, month, and separator.
fn strip_tooltip(tooltip: &str, person_name: &str) -> String {
    let mut cleaned = tooltip.replace(person_name, "");
    for artifact in STRIP_ARTIFACTS {
        cleaned = cleaned.replace(artifact, "");
    }
    cleaned.trim().to_string()
}

/// Parse a year-less day/month string against a strftime pattern.
fn parse_day_month(text: &str, pattern: &str) -> Option<(u32, u32)> {
    // chrono only parses complete dates; pin a leap year so 29.02 works.
    let date = NaiveDate::parse_from_str(&format!("{text}|2000"), &format!("{pattern}|%Y")).ok()?;
    Some((date.day(), date.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn any_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[test]
    fn us_tooltip_resolves_month_first() {
        let resolved = resolve_birthday("John Smith (03/15)", "John Smith", "en_US", any_day());
        assert_eq!(resolved.unwrap(), (15, 3));
    }

    #[test]
    fn german_tooltip_resolves_day_first() {
        let resolved =
            resolve_birthday("Max Mustermann (15.03.)", "Max Mustermann", "de_DE", any_day());
        assert_eq!(resolved.unwrap(), (15, 3));
    }

    #[test]
    fn directionality_marks_are_stripped() {
        let resolved = resolve_birthday(
            "\u{5d3}\u{5d5}\u{5d3} (&#x200f;15.3&#x200f;)",
            "\u{5d3}\u{5d5}\u{5d3}",
            "he_IL",
            any_day(),
        );
        assert_eq!(resolved.unwrap(), (15, 3));
    }

    #[test]
    fn day_name_resolves_relative_to_monday() {
        // 2024-06-10 is a Monday; "Monday" means next Monday, a week out.
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let resolved = resolve_birthday("Monday", "John Smith", "en_US", today);
        assert_eq!(resolved.unwrap(), (17, 6));
    }

    #[test]
    fn day_name_resolves_relative_to_wednesday() {
        // From Wednesday 2024-06-12 the same "Monday" is five days out.
        let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let resolved = resolve_birthday("Monday", "John Smith", "en_US", today);
        assert_eq!(resolved.unwrap(), (17, 6));
    }

    #[test]
    fn day_name_crossing_month_boundary() {
        // 2024-06-28 is a Friday; next Tuesday lands in July.
        let today = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let resolved = resolve_birthday("Tuesday", "John Smith", "en_US", today);
        assert_eq!(resolved.unwrap(), (2, 7));
    }

    #[test]
    fn unsupported_locale_is_rejected() {
        let err = resolve_birthday("15/3", "x", "ar_AR", any_day()).unwrap_err();
        assert!(matches!(err, DateParseError::UnsupportedLocale(_)));
    }

    #[test]
    fn unknown_day_name_is_rejected() {
        let err = resolve_birthday("Blursday", "x", "en_US", any_day()).unwrap_err();
        assert!(matches!(err, DateParseError::UnrecognizedDayName(_)));
    }

    #[test]
    fn every_pattern_round_trips() {
        let cases = [(1, 1), (5, 3), (15, 3), (31, 12), (29, 2)];
        for (locale, pattern) in formats::LOCALE_DATE_FORMATS.iter().copied() {
            for (day, month) in cases {
                let date = NaiveDate::from_ymd_opt(2000, month, day).unwrap();
                let rendered = date.format(pattern).to_string();
                let parsed = parse_day_month(&rendered, pattern);
                assert_eq!(parsed, Some((day, month)), "locale {locale}");
            }
        }
    }
}
