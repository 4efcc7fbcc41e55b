use crate::input::ValidationError;
use thiserror::Error;

const MAX_BODY_IN_REASON: usize = 200;

/// Everything that can send a pipeline to `Failed`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned HTTP {status}{}", body_suffix(.body))]
    Server { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timeout")]
    Timeout,
}

impl PipelineError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        PipelineError::Malformed(detail.into())
    }

    pub fn server(status: u16, body: &str) -> Self {
        let body = body.trim();
        let body = match body.char_indices().nth(MAX_BODY_IN_REASON) {
            Some((cut, _)) => format!("{}…", &body[..cut]),
            None => body.to_string(),
        };
        PipelineError::Server { status, body }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Transport(_) => "transport",
            PipelineError::Server { .. } => "server",
            PipelineError::Malformed(_) => "malformed",
            PipelineError::Timeout => "timeout",
        }
    }
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_reason_carries_status_code() {
        let err = PipelineError::server(503, "");
        assert_eq!(err.to_string(), "server returned HTTP 503");

        let err = PipelineError::server(422, " {\"detail\":\"bad ticker\"} ");
        assert_eq!(
            err.to_string(),
            "server returned HTTP 422: {\"detail\":\"bad ticker\"}"
        );
    }

    #[test]
    fn long_server_bodies_are_truncated() {
        let body = "x".repeat(1000);
        let PipelineError::Server { body, .. } = PipelineError::server(500, &body) else {
            panic!("expected server error");
        };
        assert_eq!(body.chars().count(), MAX_BODY_IN_REASON + 1);
        assert!(body.ends_with('…'));
    }

    #[test]
    fn timeout_reason_is_bare() {
        assert_eq!(PipelineError::Timeout.to_string(), "timeout");
        assert_eq!(PipelineError::Timeout.kind(), "timeout");
    }

    #[test]
    fn validation_errors_convert() {
        let err: PipelineError = ValidationError::EmptyTicker.into();
        assert_eq!(err.to_string(), "invalid input: ticker must not be empty");
        assert_eq!(err.kind(), "validation");
    }
}
