use url::Url;

/// Lower-cases, assumes `https://` when no scheme is given, and returns the network location with any
/// leading `www.` removed. Empty input yields an empty string.
pub fn normalize_domain(url: &str) -> String {
    let raw = url.trim().to_lowercase();
    if raw.is_empty() {
        return String::new();
    }
    let with_scheme = if raw.contains("://") { raw } else { format!("https://{raw}") };

    let netloc = match Url::parse(&with_scheme) {
        Ok(u) => match (u.host_str(), u.port()) {
            (Some(h), Some(p)) => format!("{h}:{p}"),
            (Some(h), None) => h.to_string(),
            (None, _) => String::new(),
        },
        Err(_) => netloc_fallback(&with_scheme),
    };

    let mut domain = netloc.as_str();
    while let Some(rest) = domain.strip_prefix("www.") {
        domain = rest;
    }
    domain.to_string()
}

// Unparseable input (stray spaces, bad ports): take whatever sits between the scheme and the path.
fn netloc_fallback(url: &str) -> String {
    let after = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let end = after.find(['/', '?', '#']).unwrap_or(after.len());
    let host = &after[..end];
    host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host).to_string()
}

/// Allow-list of authoritative news domains. Immutable once built.
#[derive(Debug, Clone)]
pub struct TrustedDomains {
    domains: Vec<String>,
}

impl TrustedDomains {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| normalize_domain(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Exact match or a subdomain of a trusted entry; raw suffix matches across a label boundary do not count.
    pub fn contains_domain(&self, domain: &str) -> bool {
        if domain.is_empty() {
            return false;
        }
        self.domains.iter().any(|trusted| {
            domain == trusted
                || domain
                    .strip_suffix(trusted.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    pub fn is_trusted(&self, url: &str) -> bool {
        self.contains_domain(&normalize_domain(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TRUSTED_DOMAINS;

    fn trusted() -> TrustedDomains {
        TrustedDomains::new(DEFAULT_TRUSTED_DOMAINS)
    }

    #[test]
    fn normalizes_scheme_case_and_www() {
        assert_eq!(normalize_domain("https://www.BBC.com/news/x"), "bbc.com");
        assert_eq!(normalize_domain("reuters.com/world"), "reuters.com");
        assert_eq!(normalize_domain("  http://edition.ndtv.com?q=1 "), "edition.ndtv.com");
        assert_eq!(normalize_domain("localhost:8080/path"), "localhost:8080");
        assert_eq!(normalize_domain(""), "");
        assert_eq!(normalize_domain("   "), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        for u in [
            "https://www.bbc.com/news/x",
            "www.www.example.org",
            "HTTP://Sub.Reuters.com:8443/a",
            "thehindu.com",
            "not a url at all",
        ] {
            let once = normalize_domain(u);
            assert_eq!(normalize_domain(&once), once, "input {u}");
            assert_eq!(normalize_domain(&format!("https://{once}")), once, "input {u}");
        }
    }

    #[test]
    fn trusts_exact_and_subdomains() {
        let t = trusted();
        assert!(t.is_trusted("https://www.bbc.com/news/x"));
        assert!(t.is_trusted("bbc.com"));
        assert!(t.is_trusted("https://feeds.reuters.com/rss"));
        assert!(t.is_trusted("WWW.THEHINDU.COM"));
    }

    #[test]
    fn suffix_match_requires_label_boundary() {
        let t = trusted();
        assert!(!t.is_trusted("bbc.com.evil.com"));
        assert!(!t.is_trusted("https://notbbc.com/story"));
        assert!(!t.is_trusted("https://evilreuters.com"));
    }

    #[test]
    fn empty_is_never_trusted() {
        let t = trusted();
        assert!(!t.is_trusted(""));
        assert!(!t.contains_domain(""));
    }
}
