//! Wire shapes of the service responses and their conversion into the domain model.
//!
//! A field that is absent where an empty/default value still means something
//! (`forecast`, `recommendations`, `explanation`, `chart`, the optional metrics)
//! is defaulted. A field that is present with the wrong type fails the whole
//! response; numbers are never coerced to zero.

use crate::client::error::PipelineError;
use crate::domain::forecast::{ForecastPoint, ForecastResult, DEFAULT_EXPLANATION};
use crate::domain::recommendation::{ChartPayload, Recommendation, RecommendationResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const DEFAULT_CURRENCY: &str = "EUR";
const SOFT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireForecastResponse {
    #[serde(default)]
    pub forecast: Option<Vec<WireForecastPoint>>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireForecastPoint {
    pub ds: String,
    pub yhat: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRecommendationResponse {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub fx_rate_usd_per_eur: Option<f64>,
    pub budget_eur: f64,
    #[serde(default)]
    pub leftover_eur: Option<f64>,
    pub horizon_months: u32,
    #[serde(default)]
    pub recommendations: Option<Vec<WireRecommendation>>,
    #[serde(default)]
    pub chart: Option<WireChart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRecommendation {
    pub ticker: String,
    #[serde(alias = "last_price", alias = "lastPrice")]
    pub last: f64,
    #[serde(default, alias = "momentum_6m")]
    pub momentum6m: Option<f64>,
    #[serde(default)]
    pub sharpe: Option<f64>,
    #[serde(default)]
    pub drawdown: Option<f64>,
    pub weight: f64,
    #[serde(alias = "allocation")]
    pub alloc: f64,
    pub shares: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireChart {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub series: BTreeMap<String, Vec<f64>>,
}

pub fn normalize_forecast(raw: Value) -> Result<ForecastResult, PipelineError> {
    decode::<WireForecastResponse>(raw, "forecast")?.validate_and_into_result()
}

pub fn normalize_recommendation(raw: Value) -> Result<RecommendationResult, PipelineError> {
    decode::<WireRecommendationResponse>(raw, "recommendation")?.validate_and_into_result()
}

fn decode<T: DeserializeOwned>(raw: Value, what: &str) -> Result<T, PipelineError> {
    if !raw.is_object() {
        return Err(PipelineError::malformed(format!(
            "{what} response must be a JSON object"
        )));
    }
    serde_json::from_value::<T>(raw)
        .map_err(|e| PipelineError::malformed(format!("{what} response: {e}")))
}

impl WireForecastResponse {
    pub fn validate_and_into_result(self) -> Result<ForecastResult, PipelineError> {
        let mut points = Vec::new();
        for (i, p) in self.forecast.unwrap_or_default().into_iter().enumerate() {
            let date = p.ds.trim().to_string();
            if date.is_empty() {
                return Err(PipelineError::malformed(format!(
                    "forecast[{i}].ds must be non-empty"
                )));
            }
            points.push(ForecastPoint {
                date,
                predicted_price: p.yhat,
            });
        }

        let explanation = self
            .explanation
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string());

        Ok(ForecastResult {
            points,
            explanation,
        })
    }
}

impl WireRecommendationResponse {
    pub fn validate_and_into_result(self) -> Result<RecommendationResult, PipelineError> {
        let mut seen = BTreeSet::<String>::new();
        let mut recommendations = Vec::new();
        for (i, item) in self.recommendations.unwrap_or_default().into_iter().enumerate() {
            recommendations.push(item.validate_and_into_item(i, &mut seen)?);
        }

        let chart = self.chart.unwrap_or_default().validate_and_into_payload()?;

        let currency = self
            .currency
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let result = RecommendationResult {
            currency,
            fx_rate: self.fx_rate_usd_per_eur,
            budget: self.budget_eur,
            leftover: self.leftover_eur,
            horizon_months: self.horizon_months,
            recommendations,
            chart,
        };
        warn_on_soft_invariants(&result);
        Ok(result)
    }
}

impl WireRecommendation {
    fn validate_and_into_item(
        self,
        index: usize,
        seen: &mut BTreeSet<String>,
    ) -> Result<Recommendation, PipelineError> {
        let ticker = self.ticker.trim().to_string();
        if ticker.is_empty() {
            return Err(PipelineError::malformed(format!(
                "recommendations[{index}].ticker must be non-empty"
            )));
        }
        if !seen.insert(ticker.clone()) {
            return Err(PipelineError::malformed(format!(
                "duplicate ticker in recommendations: {ticker}"
            )));
        }
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(PipelineError::malformed(format!(
                "{ticker}: weight must be between 0 and 1 (got {})",
                self.weight
            )));
        }
        if self.shares < 0.0 {
            return Err(PipelineError::malformed(format!(
                "{ticker}: shares must be >= 0 (got {})",
                self.shares
            )));
        }
        if let Some(drawdown) = self.drawdown.filter(|d| *d > 0.0) {
            return Err(PipelineError::malformed(format!(
                "{ticker}: drawdown must be <= 0 (got {drawdown})"
            )));
        }

        Ok(Recommendation {
            ticker,
            last_price: self.last,
            momentum_6m: self.momentum6m,
            sharpe: self.sharpe,
            drawdown: self.drawdown,
            weight: self.weight,
            allocation: self.alloc,
            shares: self.shares,
            cost: self.cost,
        })
    }
}

impl WireChart {
    fn validate_and_into_payload(self) -> Result<ChartPayload, PipelineError> {
        let expected = self.dates.len();
        for (ticker, values) in &self.series {
            if values.len() != expected {
                return Err(PipelineError::malformed(format!(
                    "chart series {ticker} has {} points but there are {expected} dates",
                    values.len()
                )));
            }
        }
        Ok(ChartPayload {
            dates: self.dates,
            series: self.series,
        })
    }
}

fn warn_on_soft_invariants(result: &RecommendationResult) {
    let total_weight = result.total_weight();
    if total_weight > 1.0 + SOFT_EPSILON {
        tracing::warn!(total_weight, "recommendation weights sum above 1");
    }
    let total_cost = result.total_cost();
    if total_cost > result.budget + SOFT_EPSILON.max(result.budget * SOFT_EPSILON) {
        tracing::warn!(
            total_cost,
            budget = result.budget,
            "recommendation cost exceeds requested budget"
        );
    }
}
