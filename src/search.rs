// src/search.rs
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::RetrievalConfig;
use crate::types::OfficialArticle;

/// Search backend for official coverage. Implementations never fail: any transport or parse
/// problem yields an empty list.
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(&self, query: &str, timeout: Duration, limit: usize) -> Vec<OfficialArticle>;
}

/// Google News RSS search.
pub struct GoogleNewsRss {
    http: Client,
    endpoint: String,
    hl: String,
    gl: String,
    ceid: String,
    limiter: DefaultDirectRateLimiter,
}

impl GoogleNewsRss {
    pub fn new(cfg: &RetrievalConfig) -> Self {
        let qps = NonZeroU32::new(cfg.max_qps).unwrap_or(nonzero!(1u32));
        Self {
            http: Client::new(),
            endpoint: cfg.endpoint.clone(),
            hl: cfg.hl.clone(),
            gl: cfg.gl.clone(),
            ceid: cfg.ceid.clone(),
            limiter: RateLimiter::direct(Quota::per_second(qps)),
        }
    }

    pub fn feed_url(&self, query: &str) -> Option<Url> {
        let mut url = Url::parse(&self.endpoint).ok()?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("hl", &self.hl)
            .append_pair("gl", &self.gl)
            .append_pair("ceid", &self.ceid);
        Some(url)
    }

    /// `timeout` bounds the whole call, including any wait for a rate-limit slot.
    async fn fetch(&self, url: Url, timeout: Duration) -> anyhow::Result<String> {
        let request = async {
            self.limiter.until_ready().await;
            let body = self.http
                .get(url)
                .send().await?
                .error_for_status()?
                .text().await?;
            Ok::<_, anyhow::Error>(body)
        };
        tokio::time::timeout(timeout, request).await?
    }
}

#[async_trait]
impl Searcher for GoogleNewsRss {
    async fn search(&self, query: &str, timeout: Duration, limit: usize) -> Vec<OfficialArticle> {
        let Some(url) = self.feed_url(query) else {
            warn!(endpoint = %self.endpoint, "invalid search endpoint");
            return Vec::new();
        };
        match self.fetch(url, timeout).await {
            Ok(xml) => {
                let items = parse_feed(&xml, limit);
                debug!(count = items.len(), "feed parsed");
                items
            }
            Err(err) => {
                warn!(error = %err, "official article search failed");
                Vec::new()
            }
        }
    }
}

static ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<item\b[^>]*>(.*?)</item>").expect("static regex compiles"));
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("static regex compiles"));
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<link\b[^>]*>(.*?)</link>").expect("static regex compiles"));
static DESC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<description\b[^>]*>(.*?)</description>").expect("static regex compiles"));
static SOURCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<source\b([^>]*)>(.*?)</source>").expect("static regex compiles"));
static URL_ATTR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)\burl\s*=\s*"([^"]*)""#).expect("static regex compiles"));

fn decode_rss_text(raw: &str) -> String {
    let trimmed = raw
        .trim()
        .trim_start_matches("<![CDATA[")
        .trim_end_matches("]]>")
        .trim();
    trimmed
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn field(re: &Regex, item: &str) -> String {
    re.captures(item)
        .and_then(|cap| cap.get(1))
        .map(|m| decode_rss_text(m.as_str()))
        .unwrap_or_default()
}

/// Items in feed order, at most `limit`. Missing fields become empty strings; the source domain is
/// the `<source url=..>` attribute, else the source name, lower-cased.
pub fn parse_feed(xml: &str, limit: usize) -> Vec<OfficialArticle> {
    ITEM_RE
        .captures_iter(xml)
        .filter_map(|cap| cap.get(1))
        .take(limit)
        .map(|m| {
            let item = m.as_str();
            let source_domain = SOURCE_RE
                .captures(item)
                .map(|cap| {
                    let href = cap
                        .get(1)
                        .and_then(|attrs| URL_ATTR_RE.captures(attrs.as_str()))
                        .and_then(|c| c.get(1))
                        .map(|u| decode_rss_text(u.as_str()))
                        .unwrap_or_default();
                    if href.is_empty() {
                        cap.get(2).map(|t| decode_rss_text(t.as_str())).unwrap_or_default()
                    } else {
                        href
                    }
                })
                .unwrap_or_default()
                .to_lowercase();
            OfficialArticle {
                title: field(&TITLE_RE, item),
                summary: field(&DESC_RE, item),
                link: field(&LINK_RE, item),
                source_domain,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?><rss><channel><title>Search</title>
      <item><title>Election results confirmed - BBC News</title>
        <link>https://news.google.com/articles/abc</link>
        <description><![CDATA[<a href="x">Officials confirm</a> local results]]></description>
        <source url="https://www.BBC.com">BBC</source></item>
      <item><title>Markets &amp; rates</title><link>https://news.google.com/articles/def</link>
        <source>Reuters</source></item>
      <item><title>Third</title></item>
    </channel></rss>"#;

    #[test]
    fn parses_items_in_feed_order() {
        let items = parse_feed(FEED, 10);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Election results confirmed - BBC News");
        assert_eq!(items[0].link, "https://news.google.com/articles/abc");
        assert_eq!(items[0].summary, r#"<a href="x">Officials confirm</a> local results"#);
        assert_eq!(items[0].source_domain, "https://www.bbc.com");
        assert_eq!(items[1].title, "Markets & rates");
        assert_eq!(items[1].summary, "");
        assert_eq!(items[1].source_domain, "reuters");
        assert_eq!(items[2], OfficialArticle { title: "Third".into(), ..Default::default() });
    }

    #[test]
    fn respects_limit_and_garbage() {
        assert_eq!(parse_feed(FEED, 1).len(), 1);
        assert!(parse_feed("not xml at all", 5).is_empty());
    }

    #[test]
    fn feed_url_encodes_query() {
        let rss = GoogleNewsRss::new(&RetrievalConfig::default());
        let url = rss.feed_url("flood relief (site:bbc.com OR site:ndtv.com)").unwrap();
        assert_eq!(
            url.as_str(),
            "https://news.google.com/rss/search?q=flood+relief+%28site%3Abbc.com+OR+site%3Andtv.com%29&hl=en-IN&gl=IN&ceid=IN%3Aen"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_yields_empty() {
        let cfg = RetrievalConfig { endpoint: "http://127.0.0.1:9/rss/search".into(), ..Default::default() };
        let rss = GoogleNewsRss::new(&cfg);
        let out = rss.search("anything", Duration::from_millis(500), 5).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn throttled_search_still_honours_timeout() {
        let cfg = RetrievalConfig { endpoint: "http://127.0.0.1:9/rss/search".into(), max_qps: 1, ..Default::default() };
        let rss = GoogleNewsRss::new(&cfg);
        assert!(rss.limiter.check().is_ok());
        let start = std::time::Instant::now();
        let out = rss.search("anything", Duration::from_millis(100), 5).await;
        assert!(out.is_empty());
        assert!(start.elapsed() < Duration::from_millis(800), "waited {:?}", start.elapsed());
    }

    #[tokio::test]
    async fn bad_endpoint_yields_empty() {
        let cfg = RetrievalConfig { endpoint: "::not a url::".into(), ..Default::default() };
        let rss = GoogleNewsRss::new(&cfg);
        assert!(rss.search("q", Duration::from_millis(100), 5).await.is_empty());
    }
}
