// src/sources/mod.rs
pub mod http;
pub mod types;

pub use types::{PostSearch, RawTrend, SocialPost, Trend, TrendSource};

use crate::normalize;

/// Boundary normalization: collapse the upstream duck-typed trend shapes into
/// the rich internal form and scrub post bodies. Called once per fetch.
pub fn normalize_trends(raw: Vec<RawTrend>) -> Vec<Trend> {
    raw.into_iter().map(Trend::from).collect()
}

pub fn normalize_posts(mut posts: Vec<SocialPost>) -> Vec<SocialPost> {
    for p in &mut posts {
        p.text = normalize::normalize_post_text(&p.text);
    }
    posts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trends_upgrades_bare_names() {
        let raw = vec![
            RawTrend::Name("1. #Tendencia".into()),
            RawTrend::Rich {
                name: "Congreso".into(),
                tweet_count: Some("5K".into()),
                keywords: vec!["ley".into()],
            },
        ];
        let trends = normalize_trends(raw);
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].name, "1. #Tendencia");
        assert_eq!(trends[1].keywords, vec!["ley".to_string()]);
    }
}
