// src/query.rs
//! Search-query construction for the post-search collaborator.
//!
//! A cleaned trend term alone misses half the conversation: hashtag
//! spellings, de-accented variants, quoted phrases. The builder assembles an
//! OR group of variants (capped so the query string stays within what the
//! search endpoint tolerates), plus `lang:` and `since:` filters for
//! broadened "multipolar" searches.

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Cap on OR-group members; beyond this the endpoint starts truncating.
const MAX_OR_TERMS: usize = 14;

static RE_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]{2,15})").expect("mention regex"));
static RE_HASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([\wÀ-ſ]+)").expect("hashtag regex"));
static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year regex"));

/// Acronyms of institutions worth treating as actors when they appear
/// upper-cased in a post.
const ACRONYM_WHITELIST: &[&str] = &[
    "PNC", "MP", "SBS", "TSE", "SAT", "IGSS", "CC", "CSJ", "CICIG", "FECI", "UNE", "VAMOS",
    "SEMILLA", "USAC", "MINGOB", "MINEDUC", "MINFIN", "MSPAS", "BANGUAT", "SP",
];

/// Fold Spanish diacritics to ASCII.
fn to_ascii(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            'Á' | 'À' | 'Ä' => 'A',
            'É' | 'È' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Ü' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Spelling variants for one term: raw, ascii-folded, collapsed hashtag for
/// multi-word phrases, quoted phrase. Ordered and deduplicated.
pub fn term_variants(term: &str) -> Vec<String> {
    let raw = term.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    let ascii = to_ascii(raw);

    let mut out = vec![raw.to_string()];
    if ascii != raw {
        out.push(ascii.clone());
    }
    if !raw.starts_with('#') && raw.split_whitespace().count() > 1 {
        out.push(format!("#{}", raw.replace(' ', "")));
        if ascii != raw {
            out.push(format!("#{}", ascii.replace(' ', "")));
        }
        out.push(format!("\"{raw}\""));
    }

    let mut seen = BTreeSet::new();
    out.retain(|v| seen.insert(v.clone()));
    out
}

/// `since:` date string for a days-back window (minimum one day).
pub fn since_date(days_back: i64) -> String {
    let d = Utc::now() - Duration::days(days_back.max(1));
    d.format("%Y-%m-%d").to_string()
}

/// Broadened search query: OR group of term variants with language and
/// recency filters. `terms` are taken in priority order until the cap.
pub fn build_context_query(terms: &[String], lang: &str, days_back: i64) -> String {
    let mut bag: Vec<String> = Vec::new();
    let mut seen = BTreeSet::new();
    'outer: for term in terms {
        for v in term_variants(term) {
            if seen.insert(v.clone()) {
                bag.push(v);
                if bag.len() >= MAX_OR_TERMS {
                    break 'outer;
                }
            }
        }
    }
    if bag.is_empty() {
        return String::new();
    }
    format!(
        "({}) lang:{} since:{}",
        bag.join(" OR "),
        lang,
        since_date(days_back)
    )
}

/// `@mentions` in a post body, deduplicated, order preserved.
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    RE_MENTION
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .filter(|m| seen.insert(m.to_lowercase()))
        .collect()
}

/// `#hashtags` in a post body, `#` stripped, deduplicated.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    RE_HASHTAG
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .filter(|h| seen.insert(h.to_lowercase()))
        .collect()
}

/// Whitelisted institutional acronyms present in the text.
pub fn extract_acronyms(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    text.split_whitespace()
        .map(|t| {
            t.chars()
                .filter(|c| c.is_alphabetic() && c.is_uppercase())
                .collect::<String>()
        })
        .filter(|a| a.len() >= 2 && ACRONYM_WHITELIST.contains(&a.as_str()))
        .filter(|a| seen.insert(a.clone()))
        .collect()
}

/// Four-digit years (1900–2099) mentioned in the text, deduplicated.
pub fn extract_years(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    RE_YEAR
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .filter(|y| seen.insert(y.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_cover_hashtag_and_ascii_forms() {
        let v = term_variants("paro nacional");
        assert!(v.contains(&"paro nacional".to_string()));
        assert!(v.contains(&"#paronacional".to_string()));
        assert!(v.contains(&"\"paro nacional\"".to_string()));

        let v = term_variants("Bernardo Arévalo");
        assert!(v.contains(&"Bernardo Arevalo".to_string()));
        assert!(v.contains(&"#BernardoArévalo".to_string()));
    }

    #[test]
    fn hashtag_terms_do_not_double_hash() {
        let v = term_variants("#JusticiaYa");
        assert_eq!(v, vec!["#JusticiaYa".to_string()]);
    }

    #[test]
    fn context_query_caps_or_group_and_adds_filters() {
        let terms: Vec<String> = (0..30).map(|i| format!("tema{i}")).collect();
        let q = build_context_query(&terms, "es", 3);
        assert!(q.starts_with('('));
        assert!(q.contains(" lang:es since:"));
        assert_eq!(q.matches(" OR ").count(), MAX_OR_TERMS - 1);
    }

    #[test]
    fn empty_terms_give_empty_query() {
        assert_eq!(build_context_query(&[], "es", 3), "");
    }

    #[test]
    fn extractors_pull_signals_from_post_text() {
        let text = "El MP y la CICIG investigan. @prensa_gt reporta #JusticiaYa desde 2015";
        assert_eq!(extract_mentions(text), vec!["prensa_gt".to_string()]);
        assert_eq!(extract_hashtags(text), vec!["JusticiaYa".to_string()]);
        assert_eq!(
            extract_acronyms(text),
            vec!["MP".to_string(), "CICIG".to_string()]
        );
        assert_eq!(extract_years(text), vec!["2015".to_string()]);
    }
}
