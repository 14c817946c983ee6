use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Current instant as an RFC 3339 UTC string, e.g. `2026-05-09T14:00:00.000Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored timestamp into local wall-clock time.
///
/// Zoned values are converted to the local zone, naive values are taken as
/// already local. A bare date is midnight local time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return Some(zoned.with_timezone(&Local).naive_local());
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn calendar_date(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|moment| moment.date())
}

/// `Tue, May 9, 2026`, or an empty string when `raw` does not parse.
pub fn format_date_label(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(moment) => moment.format("%a, %b %-d, %Y").to_string(),
        None => String::new(),
    }
}
