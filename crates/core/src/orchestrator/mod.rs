//! Drives the forecast and recommendation pipelines.
//!
//! Each pipeline owns one [`RequestState`] behind its own mutex. The mutex is only
//! held for synchronous transitions, never across an `.await`, so the two
//! pipelines and any overlapping submissions within one pipeline make progress
//! independently. Ordering within a pipeline comes from [`Ticket`] sequence
//! numbers: a response is applied only if no newer submission exists.

mod pipeline;

pub use pipeline::{Pipeline, PipelineSnapshot, RequestState, Settlement, Ticket};

use crate::client::error::PipelineError;
use crate::client::{ApiTransport, Endpoint};
use crate::domain::contract::{normalize_forecast, normalize_recommendation};
use crate::domain::forecast::ForecastResult;
use crate::domain::recommendation::RecommendationResult;
use crate::input;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub struct Orchestrator {
    transport: Arc<dyn ApiTransport>,
    timeout: Option<Duration>,
    forecast: Mutex<Pipeline<ForecastResult>>,
    recommend: Mutex<Pipeline<RecommendationResult>>,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            transport,
            timeout: None,
            forecast: Mutex::new(Pipeline::new(Endpoint::Forecast)),
            recommend: Mutex::new(Pipeline::new(Endpoint::Recommend)),
        }
    }

    /// Client-side deadline per request. Elapsing resolves the pipeline to
    /// `Failed("timeout")`; the in-flight call is dropped.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates and claims this pipeline's next sequence number immediately; the
    /// returned future performs the call. Submission order is call order, however
    /// the futures are later polled.
    pub fn submit_forecast(
        &self,
        ticker: &str,
        days: i64,
    ) -> impl Future<Output = Settlement> + Send + '_ {
        let started = match input::validate_forecast(ticker, days) {
            Ok(request) => {
                tracing::info!(ticker = %request.ticker, days = request.days, "submitting forecast");
                Some(start(&self.forecast, &request))
            }
            Err(err) => {
                reject(&self.forecast, err.into());
                None
            }
        };

        async move {
            match started {
                Some((ticket, body)) => {
                    self.finish(&self.forecast, ticket, Endpoint::Forecast, body, normalize_forecast)
                        .await
                }
                None => Settlement::Applied,
            }
        }
    }

    /// See [`Orchestrator::submit_forecast`].
    pub fn submit_recommend(
        &self,
        budget: f64,
        months: i64,
        top_n: i64,
    ) -> impl Future<Output = Settlement> + Send + '_ {
        let started = match input::validate_recommend(budget, months, top_n) {
            Ok(request) => {
                tracing::info!(
                    budget_eur = request.budget_eur,
                    months = request.months,
                    top_n = request.top_n,
                    "submitting recommendation"
                );
                Some(start(&self.recommend, &request))
            }
            Err(err) => {
                reject(&self.recommend, err.into());
                None
            }
        };

        async move {
            match started {
                Some((ticket, body)) => {
                    self.finish(
                        &self.recommend,
                        ticket,
                        Endpoint::Recommend,
                        body,
                        normalize_recommendation,
                    )
                    .await
                }
                None => Settlement::Applied,
            }
        }
    }

    pub fn forecast_snapshot(&self) -> PipelineSnapshot<ForecastResult> {
        lock(&self.forecast).snapshot()
    }

    pub fn recommend_snapshot(&self) -> PipelineSnapshot<RecommendationResult> {
        lock(&self.recommend).snapshot()
    }

    async fn finish<T, N>(
        &self,
        cell: &Mutex<Pipeline<T>>,
        ticket: Ticket,
        endpoint: Endpoint,
        body: Result<Value, PipelineError>,
        normalize: N,
    ) -> Settlement
    where
        T: Clone,
        N: FnOnce(Value) -> Result<T, PipelineError>,
    {
        let outcome = match body {
            Ok(body) => self.call(endpoint, body).await.and_then(normalize),
            Err(e) => Err(e),
        };
        let settlement = lock(cell).settle(ticket, outcome);
        tracing::debug!(
            pipeline = %endpoint,
            sequence = ticket.sequence(),
            ?settlement,
            "request settled"
        );
        settlement
    }

    async fn call(&self, endpoint: Endpoint, body: Value) -> Result<Value, PipelineError> {
        let call = self.transport.post_json(endpoint, body);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| PipelineError::Timeout)?,
            None => call.await,
        }
    }
}

fn start<T: Clone, R: Serialize>(
    cell: &Mutex<Pipeline<T>>,
    request: &R,
) -> (Ticket, Result<Value, PipelineError>) {
    let ticket = lock(cell).begin();
    let body = serde_json::to_value(request)
        .map_err(|e| PipelineError::Transport(format!("failed to encode request body: {e}")));
    (ticket, body)
}

fn reject<T: Clone>(cell: &Mutex<Pipeline<T>>, err: PipelineError) -> Settlement {
    tracing::info!(error = %err, "submission blocked by validation");
    lock(cell).reject(&err);
    Settlement::Applied
}

fn lock<T>(cell: &Mutex<T>) -> MutexGuard<'_, T> {
    // State transitions cannot panic halfway, so a poisoned cell is still consistent.
    cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
