//! Checks raw user input before anything is sent to the service.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("{field} must be a positive whole number")]
    NonPositiveQuantity { field: &'static str },

    #[error("{field} must be a positive amount")]
    NonPositiveAmount { field: &'static str },
}

/// Body of `POST {base}/predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastRequest {
    pub ticker: String,
    pub days: u32,
}

/// Body of `POST {base}/recommend`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendRequest {
    pub budget_eur: f64,
    pub months: u32,
    pub top_n: u32,
}

pub fn validate_forecast(ticker: &str, days: i64) -> Result<ForecastRequest, ValidationError> {
    Ok(ForecastRequest {
        ticker: normalize_ticker(ticker)?,
        days: require_positive_quantity("days", days)?,
    })
}

pub fn validate_recommend(
    budget: f64,
    months: i64,
    top_n: i64,
) -> Result<RecommendRequest, ValidationError> {
    Ok(RecommendRequest {
        budget_eur: require_positive_amount("budget", budget)?,
        months: require_positive_quantity("months", months)?,
        top_n: require_positive_quantity("top_n", top_n)?,
    })
}

pub fn normalize_ticker(raw: &str) -> Result<String, ValidationError> {
    let ticker = raw.trim();
    if ticker.is_empty() {
        return Err(ValidationError::EmptyTicker);
    }
    Ok(ticker.to_uppercase())
}

pub fn require_positive_quantity(field: &'static str, n: i64) -> Result<u32, ValidationError> {
    if n <= 0 {
        return Err(ValidationError::NonPositiveQuantity { field });
    }
    u32::try_from(n).map_err(|_| ValidationError::NonPositiveQuantity { field })
}

pub fn require_positive_amount(field: &'static str, amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount { field });
    }
    Ok(amount)
}

/// Parses a count typed by the user. Fractions, `NaN` and anything else that is
/// not a whole number fail the same way a non-positive count does.
pub fn parse_count(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NonPositiveQuantity { field })
}

pub fn parse_amount(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::NonPositiveAmount { field })
}
