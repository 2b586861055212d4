use std::time::Duration;
use tracing::info;

use crate::preprocess::extract_keywords;
use crate::search::Searcher;
use crate::types::OfficialArticle;

/// Characters of raw text used as the query when no keyword survives normalisation.
pub const QUERY_FALLBACK_CHARS: usize = 120;

/// Keyword terms restricted to the official outlets: `kw1 kw2 .. (site:a OR site:b ..)`.
pub fn build_query(text: &str, official_domains: &[String], max_keywords: usize) -> String {
    let keywords = extract_keywords(text, max_keywords);
    let term = if keywords.is_empty() {
        text.chars().take(QUERY_FALLBACK_CHARS).collect::<String>()
    } else {
        keywords.join(" ")
    };
    let site_filter = official_domains
        .iter()
        .map(|d| format!("site:{d}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("{term} ({site_filter})")
}

/// One search against the official outlets; an unreachable backend gives an empty list.
pub async fn fetch_official_articles(
    searcher: &dyn Searcher,
    text: &str,
    official_domains: &[String],
    max_keywords: usize,
    timeout: Duration,
    limit: usize,
) -> Vec<OfficialArticle> {
    let query = build_query(text, official_domains, max_keywords);
    let mut articles = searcher.search(&query, timeout, limit).await;
    articles.truncate(limit);
    info!(%query, found = articles.len(), "official articles retrieved");
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_OFFICIAL_DOMAINS;
    use std::sync::Mutex;

    fn domains() -> Vec<String> {
        DEFAULT_OFFICIAL_DOMAINS.iter().map(|d| d.to_string()).collect()
    }

    struct FakeSearch {
        seen: Mutex<Vec<(String, usize)>>,
        hits: usize,
    }
    #[async_trait::async_trait]
    impl Searcher for FakeSearch {
        async fn search(&self, q: &str, _timeout: Duration, limit: usize) -> Vec<OfficialArticle> {
            self.seen.lock().unwrap().push((q.to_string(), limit));
            (0..self.hits)
                .map(|i| OfficialArticle { title: format!("t{i}"), link: format!("l{i}"), ..Default::default() })
                .collect()
        }
    }

    #[test]
    fn query_uses_keywords_and_site_filter() {
        let q = build_query("Floods hit Chennai. Chennai floods displace thousands.", &domains(), 6);
        assert_eq!(
            q,
            "flood chennai hit displace thousand (site:bbc.com OR site:reuters.com OR site:thehindu.com OR site:ndtv.com)"
        );
    }

    #[test]
    fn query_caps_keywords() {
        let q = build_query("alpha bravo charlie delta echo foxtrot golf hotel", &domains(), 6);
        assert!(q.starts_with("alpha bravo charlie delta echo foxtrot ("));
    }

    #[test]
    fn query_falls_back_to_raw_prefix() {
        let raw = format!("!! {}", "1234567890".repeat(20));
        let q = build_query(&raw, &["bbc.com".to_string()], 6);
        let expected: String = raw.chars().take(QUERY_FALLBACK_CHARS).collect();
        assert_eq!(q, format!("{expected} (site:bbc.com)"));
    }

    #[tokio::test]
    async fn fetch_passes_limit_and_bounds_result() {
        let fake = FakeSearch { seen: Mutex::new(vec![]), hits: 20 };
        let out = fetch_official_articles(&fake, "Budget announced", &domains(), 6, Duration::from_secs(1), 12).await;
        assert_eq!(out.len(), 12);
        assert_eq!(out[0].title, "t0");
        let seen = fake.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, 12);
        assert!(seen[0].0.starts_with("budget announced ("));
    }
}
