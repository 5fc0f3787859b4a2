//! Birthday record produced by the fetcher.

use std::fmt;

/// One contact's birthday, immutable once built.
///
/// `uid` is the service's stable numeric identifier for the person; the
/// calendar builder uses it as the durable event identifier, so it must be
/// unique across the whole record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Birthday {
    /// Stable per-person identifier.
    pub uid: String,
    /// Display name, already HTML-unescaped.
    pub name: String,
    /// Day of month, 1..=31.
    pub day: u32,
    /// Month, 1..=12.
    pub month: u32,
}

impl fmt::Display for Birthday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.day, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_name_and_date() {
        let birthday = Birthday {
            uid: "100001".to_string(),
            name: "John Smith".to_string(),
            day: 15,
            month: 3,
        };
        assert_eq!(birthday.to_string(), "John Smith (15/3)");
    }
}
