// src/normalize.rs
//! Trend-label and post-text normalization.
//!
//! Trending labels arrive decorated: rank prefixes (`"3. "`), hashtag markers,
//! inline engagement counts (`"(12.3K tweets)"`, glued suffixes like
//! `Taylor839K`). `clean_trend` strips those in a fixed order and yields the
//! bare search term, or `None` when nothing usable remains. Every branch is
//! best-effort string surgery; nothing here returns an error.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_RANK_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").expect("rank regex"));
static RE_TRAILING_PARENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)$").expect("parens regex"));
static RE_TRAILING_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+[KMB]?$").expect("count regex"));
static RE_TRAILING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\d+$").expect("digits regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Minimum length (in chars) for a cleaned term to be worth searching.
pub const MIN_TERM_CHARS: usize = 2;

/// Clean a raw trend label into a search term.
///
/// Step order matters: the rank prefix must go before the hashtag check, and
/// the parenthetical count before the glued-digit suffix. Returns `None` when
/// the survivor is shorter than [`MIN_TERM_CHARS`].
pub fn clean_trend(raw: &str) -> Option<String> {
    let mut text = RE_RANK_PREFIX.replace(raw.trim(), "").trim().to_string();

    if let Some(rest) = text.strip_prefix('#') {
        text = rest.to_string();
    }

    text = RE_TRAILING_PARENS.replace(&text, "").to_string();
    text = RE_TRAILING_COUNT.replace(&text, "").to_string();
    text = RE_TRAILING_DIGITS.replace(&text, "").to_string();
    let text = text.trim();

    if text.chars().count() >= MIN_TERM_CHARS {
        Some(text.to_string())
    } else {
        None
    }
}

/// Normalize a post body: decode HTML entities, collapse whitespace, trim.
/// Length-capped at 1500 chars so one pathological post can't bloat a record.
pub fn normalize_post_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();
    let mut out = RE_WS.replace_all(&decoded, " ").trim().to_string();
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_rank_hashtag_and_glued_count() {
        assert_eq!(clean_trend("1. #Taylor839K").as_deref(), Some("Taylor"));
    }

    #[test]
    fn strips_parenthetical_count() {
        assert_eq!(
            clean_trend("Bernardo Arévalo (12.5K tweets)").as_deref(),
            Some("Bernardo Arévalo")
        );
    }

    #[test]
    fn rejects_too_short_terms() {
        assert_eq!(clean_trend("a"), None);
        assert_eq!(clean_trend("#1"), None);
        assert_eq!(clean_trend("42"), None);
        assert_eq!(clean_trend(""), None);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let samples = [
            "1. #Taylor839K",
            "3. Congreso (5K)",
            "#JusticiaYa",
            "Sandra Torres 120",
            "plain term",
        ];
        for s in samples {
            if let Some(once) = clean_trend(s) {
                let twice = clean_trend(&once);
                assert_eq!(twice.as_deref(), Some(once.as_str()), "input: {s}");
            }
        }
    }

    #[test]
    fn keeps_internal_digits() {
        // Digits in the middle survive; only the trailing run goes.
        assert_eq!(clean_trend("Top10 Lista").as_deref(), Some("Top10 Lista"));
        assert_eq!(clean_trend("Decreto 4-2025").as_deref(), Some("Decreto 4-"));
    }

    #[test]
    fn post_text_decodes_entities_and_collapses_ws() {
        let s = "  El congreso&nbsp;&nbsp;aprueba   la ley ";
        assert_eq!(normalize_post_text(s), "El congreso aprueba la ley");
    }
}
