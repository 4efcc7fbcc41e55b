use serde::{Deserialize, Serialize};

pub const DEFAULT_EXPLANATION: &str = "No explanation provided.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Calendar date or full timestamp, exactly as the service sent it.
    pub date: String,
    pub predicted_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Chronological, in server order.
    pub points: Vec<ForecastPoint>,
    pub explanation: String,
}
