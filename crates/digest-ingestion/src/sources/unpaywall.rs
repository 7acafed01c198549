//! Unpaywall open-access lookups.
//!
//! API: https://api.unpaywall.org/v2/{doi}?email=...

use std::time::Duration;

use digest_common::sandbox::SandboxClient;
use serde::Deserialize;
use tracing::instrument;

pub const UNPAYWALL_BASE: &str = "https://api.unpaywall.org/v2";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OaLocation {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_for_pdf: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OaRecord {
    #[serde(default)]
    pub is_oa: bool,
    #[serde(default)]
    pub best_oa_location: Option<OaLocation>,
}

impl OaRecord {
    /// Direct PDF when known, else the landing page of the best location.
    pub fn pdf_link(&self) -> Option<&str> {
        let best = self.best_oa_location.as_ref()?;
        best.url_for_pdf.as_deref().or(best.url.as_deref()).filter(|u| !u.is_empty())
    }

    pub fn landing_link(&self) -> Option<&str> {
        self.best_oa_location.as_ref()?.url.as_deref().filter(|u| !u.is_empty())
    }
}

pub struct UnpaywallClient {
    client: SandboxClient,
    base_url: String,
    email: String,
}

impl UnpaywallClient {
    pub fn new(client: SandboxClient, email: &str) -> Self {
        Self { client, base_url: UNPAYWALL_BASE.to_string(), email: email.trim().to_string() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Unpaywall refuses anonymous requests.
    pub fn is_configured(&self) -> bool {
        !self.email.is_empty()
    }

    #[instrument(skip(self))]
    pub async fn lookup(&self, doi: &str) -> anyhow::Result<OaRecord> {
        let record = self.client
            .get(&format!("{}/{}", self.base_url, doi))?
            .query(&[("email", self.email.as_str())])
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json::<OaRecord>()
            .await?;
        Ok(record)
    }
}
