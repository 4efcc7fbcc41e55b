use crate::client::error::PipelineError;
use crate::client::{ApiTransport, Endpoint};
use crate::config::Settings;
use anyhow::Context;
use serde_json::Value;
use std::time::Duration;

// Transport-level ceiling. The pipeline timeout (`API_TIMEOUT_SECS`) is
// enforced separately by the orchestrator and is usually shorter.
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings.require_api_base_url()?;
        Self::new(base_url)
    }

    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

#[async_trait::async_trait]
impl ApiTransport for HttpTransport {
    async fn post_json(&self, endpoint: Endpoint, body: Value) -> Result<Value, PipelineError> {
        let url = self.url(endpoint);
        tracing::debug!(%endpoint, %url, "sending request");

        let res = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        let text = res.text().await.map_err(transport_error)?;

        if !status.is_success() {
            tracing::warn!(%endpoint, %status, "service returned non-success status");
            return Err(PipelineError::server(status.as_u16(), &text));
        }

        serde_json::from_str::<Value>(&text)
            .map_err(|e| PipelineError::malformed(format!("response is not valid JSON: {e}")))
    }
}

fn transport_error(err: reqwest::Error) -> PipelineError {
    if err.is_timeout() {
        PipelineError::Timeout
    } else {
        PipelineError::Transport(err.without_url().to_string())
    }
}
