//! Weekday-name to day-offset resolution.
//!
//! Birthdays in the next seven days render as weekday names in the
//! account's locale rather than dates. The offset table maps each
//! lowercased name to how many days past today it falls (1 = tomorrow).

use std::collections::HashMap;

use chrono::{Days, Locale, NaiveDate};

use crate::error::DateParseError;

/// Service locale codes absent from the locale registry, mapped onto their
/// closest registry equivalent.
const LOCALE_ALIASES: &[(&str, &str)] = &[
    ("cx_PH", "tl_PH"), // Cebuano -> Filipino
    ("en_UD", "en_US"), // upside-down English
    ("eo_EO", "eo"),
    ("es_LA", "es_ES"), // Latin-American Spanish
    ("ja_KS", "ja_JP"), // Kansai Japanese
    ("sz_PL", "pl_PL"), // Silesian
    ("zz_TR", "tr_TR"),
];

/// Maps a service locale identifier onto a formatting locale.
///
/// Providers are consulted in priority order; the first that resolves
/// wins.
trait LocaleResolver {
    fn resolve(&self, locale: &str) -> Option<Locale>;
}

/// Direct parse against the embedded locale registry.
struct ExactLocale;

impl LocaleResolver for ExactLocale {
    fn resolve(&self, locale: &str) -> Option<Locale> {
        Locale::try_from(locale).ok()
    }
}

/// Alias table for the service's non-POSIX codes, then the bare language
/// code as a last resort.
struct AliasLocale;

impl LocaleResolver for AliasLocale {
    fn resolve(&self, locale: &str) -> Option<Locale> {
        if let Some((_, alias)) = LOCALE_ALIASES.iter().find(|(from, _)| *from == locale) {
            if let Ok(resolved) = Locale::try_from(*alias) {
                return Some(resolved);
            }
        }

        let language = locale.split('_').next()?;
        Locale::try_from(language).ok()
    }
}

/// Build the weekday-name -> offset table for the seven days after `today`.
///
/// Today's own birthday is always rendered as a date, so offsets start at
/// 1 (tomorrow) and the table never contains an entry for today.
pub(super) fn offset_table(
    locale: &str,
    today: NaiveDate,
) -> Result<HashMap<String, u32>, DateParseError> {
    let resolvers: [&dyn LocaleResolver; 2] = [&ExactLocale, &AliasLocale];
    let resolved = resolvers
        .iter()
        .find_map(|resolver| resolver.resolve(locale))
        .ok_or_else(|| DateParseError::LocaleUnavailable(locale.to_string()))?;

    let mut table = HashMap::new();
    for offset in 1_u32..=7 {
        let date = today + Days::new(u64::from(offset));
        let name = date
            .format_localized("%A", resolved)
            .to_string()
            .to_lowercase();
        table.insert(name, offset);
    }

    Ok(table)
}
