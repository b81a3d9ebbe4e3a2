use crate::models::SongRequest;
use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use std::cmp::Ordering;

/// Parse an ISO-8601 timestamp to epoch milliseconds.
///
/// Unparseable input sorts as epoch zero instead of erroring; the backend
/// always sends RFC 3339 so this only matters for malformed payloads.
pub(crate) fn parse_iso_ms(iso: &str) -> i64 {
    DateTime::parse_from_rfc3339(iso)
        .map(|d| d.timestamp_millis())
        .unwrap_or(0)
}

/// Local calendar day (`YYYY-MM-DD`) of an ISO-8601 timestamp.
///
/// Falls back to the raw input on parse failure so grouping stays stable.
pub(crate) fn local_day_key(iso: &str) -> String {
    DateTime::parse_from_rfc3339(iso)
        .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| iso.to_string())
}

pub(crate) fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Today's day bucket: local midnight, expressed as a UTC ISO timestamp.
///
/// Matches the backend's `key` column, which pins each request to the start
/// of its local day.
pub(crate) fn today_key_iso() -> String {
    let midnight = Local::now().date_naive().and_hms_opt(0, 0, 0).unwrap_or_default();
    match Local.from_local_datetime(&midnight).earliest() {
        Some(d) => d
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        None => now_iso(),
    }
}

/// Listing order: newest day bucket first, then oldest creation first within
/// the bucket. Mirrors the server's `orderBy: [{key: desc}, {createdAt: asc}]`.
pub(crate) fn compare_requests(a: &SongRequest, b: &SongRequest) -> Ordering {
    parse_iso_ms(&b.key)
        .cmp(&parse_iso_ms(&a.key))
        .then_with(|| parse_iso_ms(&a.created_at).cmp(&parse_iso_ms(&b.created_at)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::SongRequest;

    pub(crate) fn request(id: &str, key: &str, created_at: &str) -> SongRequest {
        SongRequest {
            id: id.to_string(),
            title: format!("song-{id}"),
            requester: "unknown".to_string(),
            done: false,
            key: key.to_string(),
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
        }
    }
}
