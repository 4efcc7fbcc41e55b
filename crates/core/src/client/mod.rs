pub mod error;
pub mod http;

use crate::client::error::PipelineError;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Forecast,
    Recommend,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Forecast => "/predict",
            Endpoint::Recommend => "/recommend",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Forecast => f.write_str("forecast"),
            Endpoint::Recommend => f.write_str("recommend"),
        }
    }
}

/// One JSON round trip to the forecast/recommendation service.
///
/// Implementations return the decoded body of a successful response. Transport
/// failures, non-2xx statuses and undecodable bodies come back as the matching
/// [`PipelineError`] variant. No retries.
#[async_trait::async_trait]
pub trait ApiTransport: Send + Sync {
    async fn post_json(&self, endpoint: Endpoint, body: Value) -> Result<Value, PipelineError>;
}
