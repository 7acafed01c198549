use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::DigestError;

pub const USER_AGENT: &str = "ResearchDigestBot/1.0 (+local-app)";

/// An HTTP client that only talks to approved hosts.
/// Feed hosts are added at runtime from the configured feed URLs.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client allowing the bibliographic APIs the digest depends on.
    pub fn new() -> Result<Self, DigestError> {
        let domains = [
            "api.crossref.org",        // CrossRef
            "eutils.ncbi.nlm.nih.gov", // PubMed
            "api.unpaywall.org",       // Unpaywall
        ];
        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(25))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_lowercase());
    }

    /// Allows the host of `url`; returns false when the URL has no host.
    pub fn allow_url_host(&mut self, url: &str) -> bool {
        match Url::parse(url).ok().and_then(|u| u.host_str().map(String::from)) {
            Some(host) => {
                self.allow_domain(&host);
                true
            }
            None => false,
        }
    }

    /// Validates if a URL is permitted under the current policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Exact match or a subdomain of an allowed host
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, DigestError> {
        if !self.is_allowed(url) {
            return Err(DigestError::SecurityError(format!(
                "domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allowlist() {
        let client = SandboxClient::new().unwrap();
        assert!(client.is_allowed("https://api.crossref.org/works?rows=1"));
        assert!(client.is_allowed("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi"));
        assert!(!client.is_allowed("https://example.com/feed.xml"));
        assert!(!client.is_allowed("not a url"));
    }

    #[test]
    fn test_feed_host_added_from_url() {
        let mut client = SandboxClient::new().unwrap();
        assert!(client.allow_url_host("https://www.nature.com/nature.rss"));
        assert!(client.is_allowed("https://www.nature.com/ncomms.rss"));
        assert!(client.get("https://evil.example.org/").is_err());
    }
}
