//! Calendar document construction and serialization.
//!
//! One all-day event per person, recurring yearly, with the person's uid
//! as the durable event identifier. Serialization is RFC 5545 text: CRLF
//! line endings, escaped text values, and no blank lines.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::models::Birthday;

const PROD_ID: &str = "-//bdaycal//bdaycal//EN";
const CALENDAR_NAME: &str = "Birthdays (bdaycal)";
const PUBLISHED_TTL: &str = "PT12H";
const ORIGINAL_URL: &str = "/events/birthdays/";

/// A single yearly recurring all-day event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    uid: String,
    summary: String,
    start: NaiveDate,
}

/// An ordered set of birthday events plus fixed document metadata.
#[derive(Debug)]
pub struct Calendar {
    events: BTreeMap<String, CalendarEvent>,
    generated: NaiveDate,
}

/// Build the calendar from accumulated records.
///
/// Events are keyed by uid, so a duplicate record overwrites rather than
/// producing two events with the same identifier.
pub fn build_calendar(birthdays: &[Birthday], today: NaiveDate) -> Calendar {
    let mut events = BTreeMap::new();

    for birthday in birthdays {
        let event = CalendarEvent {
            uid: birthday.uid.clone(),
            summary: format!("{}'s Birthday", birthday.name),
            start: next_occurrence(birthday.day, birthday.month, today),
        };
        events.insert(birthday.uid.clone(), event);
    }

    Calendar {
        events,
        generated: today,
    }
}

/// The next occurrence of `month`/`day` on or after the current month.
///
/// A month earlier than the current one rolls into next year; a tie on the
/// month stays in the current year even if the day has passed. A 29 Feb
/// birthday lands on 28 Feb in non-leap years.
fn next_occurrence(day: u32, month: u32, today: NaiveDate) -> NaiveDate {
    let year = if month >= today.month() {
        today.year()
    } else {
        today.year() + 1
    };

    let mut day = day;
    loop {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return date;
        }
        day -= 1;
    }
}

impl Calendar {
    /// Serialize to ICS text. Blank lines are stripped as a final
    /// normalization step.
    pub fn to_ics(&self) -> String {
        let mut lines: Vec<String> = vec![
            "BEGIN:VCALENDAR".to_string(),
            "VERSION:2.0".to_string(),
            format!("PRODID:{PROD_ID}"),
            "CALSCALE:GREGORIAN".to_string(),
            "METHOD:PUBLISH".to_string(),
            format!("X-WR-CALNAME:{CALENDAR_NAME}"),
            format!("X-PUBLISHED-TTL:{PUBLISHED_TTL}"),
            format!("X-ORIGINAL-URL:{ORIGINAL_URL}"),
        ];

        for event in self.events.values() {
            lines.push("BEGIN:VEVENT".to_string());
            lines.push(format!("UID:{}", escape_text(&event.uid)));
            lines.push(format!("DTSTAMP:{}T000000Z", self.generated.format("%Y%m%d")));
            lines.push(format!("DTSTART;VALUE=DATE:{}", event.start.format("%Y%m%d")));
            lines.push("DURATION:P1D".to_string());
            lines.push("RRULE:FREQ=YEARLY".to_string());
            lines.push(format!("SUMMARY:{}", escape_text(&event.summary)));
            lines.push("END:VEVENT".to_string());
        }

        lines.push("END:VCALENDAR".to_string());

        let mut out: String = lines
            .into_iter()
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\r\n");
        out.push_str("\r\n");
        out
    }

    #[cfg(test)]
    fn event(&self, uid: &str) -> Option<&CalendarEvent> {
        self.events.get(uid)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.events.len()
    }
}

/// Escape a text value per RFC 5545.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}
