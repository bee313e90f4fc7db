// iCalendar feed rendering. Pure text assembly, no I/O.

use crate::models::CalendarEntry;
use chrono::{DateTime, Utc};

/// Render the expiration feed as an iCalendar document
///
/// One VEVENT per license, anchored at 09:00 UTC on the end date so the
/// entry lands on the right day in any office timezone. Lines are CRLF
/// terminated as RFC 5545 requires; `now` stamps the DTSTAMP fields.
pub fn render_ics(entries: &[CalendarEntry], base_url: &str, now: DateTime<Utc>) -> String {
    let base = base_url.trim_end_matches('/');
    let dtstamp = now.format("%Y%m%dT%H%M%SZ").to_string();

    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//license-tracker//EN".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        "X-WR-CALNAME:License expirations".to_string(),
    ];

    for entry in entries {
        let summary = format!(
            "{} - {} license expires",
            entry.customer_name, entry.product_name
        );
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@licenses", entry.public_id));
        lines.push(format!("DTSTAMP:{}", dtstamp));
        lines.push(format!(
            "DTSTART:{}T090000Z",
            entry.end_date.format("%Y%m%d")
        ));
        lines.push(format!("SUMMARY:{}", escape_text(&summary)));
        lines.push(format!(
            "DESCRIPTION:{}",
            escape_text(&format!("{}/licenses/{}", base, entry.public_id))
        ));
        lines.push("END:VEVENT".to_string());
    }

    lines.push("END:VCALENDAR".to_string());
    lines.join("\r\n") + "\r\n"
}

/// Escape TEXT values per RFC 5545 section 3.3.11
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}
