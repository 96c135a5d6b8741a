//! # HTTP Fetcher
//!
//! Plain unauthenticated GETs against the certificate-transparency APIs.
//! No retry and no timeout override, the raw body lands on disk verbatim.

use std::path::Path;

use async_trait::async_trait;
use ionicsub_common::error::StepError;
use ionicsub_common::{success, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedBody {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchedBody {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedBody, StepError>;
}

#[derive(Clone, Debug, Default)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<FetchedBody, StepError> {
        let http_err = |e: reqwest::Error| StepError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(http_err)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(http_err)?;

        Ok(FetchedBody {
            status,
            body: body.to_vec(),
        })
    }
}

pub fn crt_sh_url(domain: &str) -> String {
    format!("https://crt.sh/?q=%25.{domain}&output=json")
}

pub fn certspotter_url(domain: &str) -> String {
    format!(
        "https://api.certspotter.com/v1/issuances?domain={domain}&include_subdomains=true&expand=dns_names"
    )
}

/// Downloads `url` into `output`, replacing whatever was there.
///
/// On a transport error nothing is written and the previous file, if any,
/// stays in place. A non-2xx body is still written.
pub async fn fetch_to_file(
    fetcher: &dyn HttpFetch,
    url: &str,
    output: &Path,
) -> Result<usize, StepError> {
    let fetched = fetcher.get(url).await?;

    if !fetched.is_success() {
        warn!("{url} answered with HTTP {}", fetched.status);
    }

    tokio::fs::write(output, &fetched.body)
        .await
        .map_err(|e| StepError::io(output, e))?;

    success!("Saved {} bytes from {url}", fetched.body.len());
    Ok(fetched.body.len())
}
