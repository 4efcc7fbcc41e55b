use crate::client::error::PipelineError;
use crate::client::Endpoint;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestState<T> {
    #[default]
    Idle,
    Pending,
    Succeeded(T),
    Failed(String),
}

impl<T> RequestState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }

    pub fn succeeded(&self) -> Option<&T> {
        match self {
            RequestState::Succeeded(v) => Some(v),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            RequestState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Whether a resolved request was allowed to write its pipeline's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Applied,
    /// A later submission exists; this result was dropped.
    Superseded,
}

/// Proof of a submission. Only the holder of the newest ticket may settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    endpoint: Endpoint,
    sequence: u64,
}

impl Ticket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSnapshot<T> {
    pub state: RequestState<T>,
    /// Number of submissions made so far, valid or not.
    pub sequence: u64,
    pub settled_at: Option<DateTime<Utc>>,
}

/// State cell for one pipeline.
#[derive(Debug)]
pub struct Pipeline<T> {
    endpoint: Endpoint,
    state: RequestState<T>,
    latest: u64,
    settled_at: Option<DateTime<Utc>>,
}

impl<T: Clone> Pipeline<T> {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            state: RequestState::Idle,
            latest: 0,
            settled_at: None,
        }
    }

    /// Claims the next sequence number and moves to `Pending`, dropping whatever
    /// the previous submission left behind.
    pub fn begin(&mut self) -> Ticket {
        let ticket = self.next_ticket();
        self.state = RequestState::Pending;
        self.settled_at = None;
        ticket
    }

    /// Records a submission that never reached the network.
    pub fn reject(&mut self, err: &PipelineError) -> Ticket {
        let ticket = self.next_ticket();
        self.state = RequestState::Failed(err.to_string());
        self.settled_at = Some(Utc::now());
        ticket
    }

    pub fn settle(&mut self, ticket: Ticket, outcome: Result<T, PipelineError>) -> Settlement {
        debug_assert_eq!(ticket.endpoint, self.endpoint);
        if ticket.sequence != self.latest {
            tracing::debug!(
                pipeline = %self.endpoint,
                sequence = ticket.sequence,
                latest = self.latest,
                "discarding superseded response"
            );
            return Settlement::Superseded;
        }

        self.state = match outcome {
            Ok(value) => RequestState::Succeeded(value),
            Err(err) => {
                tracing::warn!(
                    pipeline = %self.endpoint,
                    sequence = ticket.sequence,
                    kind = err.kind(),
                    error = %err,
                    "request failed"
                );
                RequestState::Failed(err.to_string())
            }
        };
        self.settled_at = Some(Utc::now());
        Settlement::Applied
    }

    pub fn state(&self) -> &RequestState<T> {
        &self.state
    }

    pub fn snapshot(&self) -> PipelineSnapshot<T> {
        PipelineSnapshot {
            state: self.state.clone(),
            sequence: self.latest,
            settled_at: self.settled_at,
        }
    }

    fn next_ticket(&mut self) -> Ticket {
        self.latest += 1;
        Ticket {
            endpoint: self.endpoint,
            sequence: self.latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline<u32> {
        Pipeline::new(Endpoint::Recommend)
    }

    #[test]
    fn starts_idle() {
        let p = pipeline();
        assert_eq!(p.state(), &RequestState::Idle);
        assert_eq!(p.snapshot().sequence, 0);
        assert_eq!(p.snapshot().settled_at, None);
    }

    #[test]
    fn begin_clears_previous_payload() {
        let mut p = pipeline();
        let t = p.begin();
        assert_eq!(p.settle(t, Ok(7)), Settlement::Applied);
        assert_eq!(p.state().succeeded(), Some(&7));
        assert!(p.snapshot().settled_at.is_some());

        p.begin();
        assert!(p.state().is_pending());
        assert_eq!(p.state().succeeded(), None);
        assert_eq!(p.snapshot().settled_at, None);
    }

    #[test]
    fn failure_records_reason() {
        let mut p = pipeline();
        let t = p.begin();
        p.settle(t, Err(PipelineError::server(502, "")));
        assert_eq!(p.state().failure(), Some("server returned HTTP 502"));
        assert!(p.snapshot().settled_at.is_some());
    }

    #[test]
    fn stale_ticket_cannot_overwrite_newer_submission() {
        let mut p = pipeline();
        let first = p.begin();
        let second = p.begin();
        assert_eq!(second.sequence(), first.sequence() + 1);

        assert_eq!(p.settle(second, Ok(2)), Settlement::Applied);
        assert_eq!(p.settle(first, Ok(1)), Settlement::Superseded);
        assert_eq!(p.state().succeeded(), Some(&2));
    }

    #[test]
    fn stale_ticket_landing_first_leaves_pipeline_pending() {
        let mut p = pipeline();
        let first = p.begin();
        let second = p.begin();

        assert_eq!(p.settle(first, Ok(1)), Settlement::Superseded);
        assert!(p.state().is_pending());
        assert_eq!(p.settle(second, Ok(2)), Settlement::Applied);
        assert_eq!(p.state().succeeded(), Some(&2));
    }

    #[test]
    fn rejection_supersedes_in_flight_request() {
        let mut p = pipeline();
        let in_flight = p.begin();
        p.reject(&PipelineError::Validation(
            crate::input::ValidationError::EmptyTicker,
        ));

        assert_eq!(p.settle(in_flight, Ok(1)), Settlement::Superseded);
        assert_eq!(
            p.state().failure(),
            Some("invalid input: ticker must not be empty")
        );
        assert_eq!(p.snapshot().sequence, 2);
    }
}
