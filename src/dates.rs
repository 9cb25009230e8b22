// src/dates.rs
//! Timestamp resolution for scraped posts.
//!
//! Upstream hands us whatever the scraper saw: relative offsets ("2h"),
//! Nitter's "Jul 23, 2025 · 6:17 AM UTC", ISO strings with microseconds and
//! no zone, or nothing at all. Persistence must never be blocked by a date,
//! so resolution always produces *some* absolute timestamp; the provenance
//! tag tells callers (and tests) which rung of the ladder fired.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Millisecond epoch the platform packs into the high bits of post ids.
const SNOWFLAKE_EPOCH_MS: i64 = 1_288_834_974_657;

/// Earliest plausible year for a snowflake-derived timestamp.
const SNOWFLAKE_MIN_YEAR: i32 = 2010;

static RE_RELATIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)([smhdwy])$").expect("relative regex"));
static RE_ISO_MICROS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{6}$").expect("micros regex"));
static RE_ISO_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}$").expect("bare iso regex"));

/// Which rung of the resolution ladder produced the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// A relative offset like "2h" subtracted from now.
    Relative,
    /// A literal parse of the raw string.
    Literal,
    /// Derived from the high bits of the post id.
    Snowflake,
    /// Nothing worked; wall-clock now. Data-quality signal.
    Now,
}

/// Resolve a raw timestamp string (and optional post id) to an absolute UTC time.
/// Never fails; logs at debug level when it had to fall back to "now".
pub fn resolve(raw: Option<&str>, fallback_id: Option<&str>) -> DateTime<Utc> {
    let (ts, source) = resolve_with_source(raw, fallback_id, Utc::now());
    if source == DateSource::Now {
        tracing::debug!(target: "dates", raw = ?raw, id = ?fallback_id, "unparseable date, used wall clock");
    }
    ts
}

/// Core resolver with an explicit `now` so window math is testable.
pub fn resolve_with_source(
    raw: Option<&str>,
    fallback_id: Option<&str>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateSource) {
    if let Some(s) = raw {
        let s = s.trim();

        if let Some(ts) = parse_relative(s, now) {
            return (ts, DateSource::Relative);
        }

        if !is_placeholder(s) {
            if let Some(ts) = parse_literal(s) {
                // A date more than a day ahead of now is clock skew or garbage;
                // fall through to the id-derived path instead of persisting it.
                if ts <= now + Duration::hours(24) {
                    return (ts, DateSource::Literal);
                }
            }
        }
    }

    if let Some(ts) = from_snowflake(fallback_id) {
        return (ts, DateSource::Snowflake);
    }

    (now, DateSource::Now)
}

/// "2h", "15m", "3d": an integer plus a unit, nothing else.
fn parse_relative(s: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = RE_RELATIVE.captures(s)?;
    let value: i64 = caps[1].parse().ok()?;
    let delta = match &caps[2] {
        "s" => Duration::seconds(value),
        "m" => Duration::minutes(value),
        "h" => Duration::hours(value),
        "d" => Duration::days(value),
        "w" => Duration::weeks(value),
        "y" => Duration::days(value * 365),
        _ => return None,
    };
    now.checked_sub_signed(delta)
}

/// Phrases the scraper emits when it has no real timestamp.
fn is_placeholder(s: &str) -> bool {
    matches!(
        s.to_lowercase().as_str(),
        "recent" | "now" | "just now" | "ahora" | "reciente" | "hace un momento"
    )
}

/// Literal parse after separator normalization.
fn parse_literal(s: &str) -> Option<DateTime<Utc>> {
    let mut clean = s.replace(" · ", " ").trim().to_string();
    if let Some(stripped) = clean.strip_suffix(" UTC") {
        clean = stripped.trim_end().to_string();
    }

    // 2025-07-23T06:17:41.248063 → truncate micros to millis, pin to UTC.
    if RE_ISO_MICROS.is_match(&clean) {
        clean = format!("{}Z", &clean[..23]);
    } else if RE_ISO_BARE.is_match(&clean) {
        clean.push('Z');
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&clean) {
        return Some(dt.with_timezone(&Utc));
    }

    // Nitter absolute form: "Jul 23, 2025 6:17 AM" (zone already stripped).
    for fmt in ["%b %d, %Y %I:%M %p", "%B %d, %Y %I:%M %p"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&clean, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(&clean, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    None
}

/// Derive a creation time from a snowflake-style id: the high bits hold
/// milliseconds since the platform epoch. Rejected when the derived year is
/// implausibly early (non-snowflake numeric ids shift down to ~1970).
fn from_snowflake(id: Option<&str>) -> Option<DateTime<Utc>> {
    let id: u64 = id?.trim().parse().ok()?;
    let ms = (id >> 22) as i64 + SNOWFLAKE_EPOCH_MS;
    let ts = Utc.timestamp_millis_opt(ms).single()?;
    use chrono::Datelike;
    if ts.year() >= SNOWFLAKE_MIN_YEAR {
        Some(ts)
    } else {
        None
    }
}
