use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub currency: String,
    /// USD per one unit of `currency`, when the service could source it.
    pub fx_rate: Option<f64>,
    pub budget: f64,
    pub leftover: Option<f64>,
    pub horizon_months: u32,
    /// Ranked; index 0 is the top pick.
    pub recommendations: Vec<Recommendation>,
    pub chart: ChartPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub ticker: String,
    pub last_price: f64,
    /// Fractional six-month return, e.g. `0.12` for +12%.
    pub momentum_6m: Option<f64>,
    pub sharpe: Option<f64>,
    /// Peak-to-trough, `<= 0`.
    pub drawdown: Option<f64>,
    pub weight: f64,
    pub allocation: f64,
    pub shares: f64,
    pub cost: f64,
}

/// Normalized index series keyed by ticker; `1.0` is each series' starting value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    pub dates: Vec<String>,
    pub series: BTreeMap<String, Vec<f64>>,
}

impl RecommendationResult {
    pub fn total_cost(&self) -> f64 {
        self.recommendations.iter().map(|r| r.cost).sum()
    }

    pub fn total_weight(&self) -> f64 {
        self.recommendations.iter().map(|r| r.weight).sum()
    }
}

impl ChartPayload {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.series.is_empty()
    }
}
