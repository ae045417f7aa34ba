//! Request/response transport to the remote sync service.

use crate::config::RemoteConfig;
use crate::protocol::SyncRequest;
use crate::utils::{Result, SyncError, ValidationError};
use reqwest::Url;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

/// Carries one request to the remote and returns the raw response body.
pub trait Transport: Send + Sync {
    fn exchange(&self, request: &SyncRequest) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Parse and check a remote endpoint: absolute, http or https, with a host.
pub fn validate_url(raw: &str) -> std::result::Result<Url, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(url)
}

/// Form-encoded POST over HTTP(S).
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
}

impl HttpTransport {
    pub fn new(url: &str, config: &RemoteConfig) -> Result<Self> {
        let url = validate_url(url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("deltasync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Transport for HttpTransport {
    async fn exchange(&self, request: &SyncRequest) -> Result<Vec<u8>> {
        let fields = request.form_fields()?;

        debug!("POST {} ({} fields)", self.url, fields.len());
        let resp = self.client.post(self.url.clone()).form(&fields).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Sync request failed with status {}: {}", status, error_text);
            return Err(SyncError::Remote(format!(
                "HTTP {}: {}",
                status,
                error_text.trim()
            )));
        }

        Ok(resp.bytes().await?.to_vec())
    }
}
