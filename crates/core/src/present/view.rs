use crate::domain::forecast::ForecastResult;
use crate::domain::recommendation::{ChartPayload, RecommendationResult};
use crate::present::format::{
    currency_symbol, date_label, format_currency, format_fx_rate, format_percent, format_price,
    format_ratio, format_shares, scale_series,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub rows: Vec<ForecastRow>,
    pub explanation: String,
    pub summary: Option<ForecastSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastRow {
    pub date: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastSummary {
    pub days: usize,
    pub first: String,
    pub last: String,
    pub average: String,
    /// First to last predicted price.
    pub change: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationView {
    pub currency: String,
    pub fx_rate: String,
    pub budget: String,
    pub leftover: String,
    pub invested: String,
    pub total_weight: String,
    pub horizon: String,
    pub rows: Vec<RecommendationRow>,
    pub chart: ChartView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationRow {
    pub rank: usize,
    pub ticker: String,
    pub last_price: String,
    pub momentum_6m: String,
    pub sharpe: String,
    pub drawdown: String,
    pub weight: String,
    pub allocation: String,
    pub shares: String,
    pub cost: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartView {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub ticker: String,
    /// Display scale, 100 = starting value.
    pub values: Vec<f64>,
}

pub fn forecast_view(result: &ForecastResult) -> ForecastView {
    let rows = result
        .points
        .iter()
        .map(|p| ForecastRow {
            date: date_label(&p.date).to_string(),
            price: format_price(Some(p.predicted_price)),
        })
        .collect();

    ForecastView {
        rows,
        explanation: result.explanation.clone(),
        summary: forecast_summary(result),
    }
}

fn forecast_summary(result: &ForecastResult) -> Option<ForecastSummary> {
    let first = result.points.first()?.predicted_price;
    let last = result.points.last()?.predicted_price;
    let days = result.points.len();
    let average = result.points.iter().map(|p| p.predicted_price).sum::<f64>() / days as f64;
    let change = if first != 0.0 {
        Some((last - first) / first)
    } else {
        None
    };

    Some(ForecastSummary {
        days,
        first: format_price(Some(first)),
        last: format_price(Some(last)),
        average: format_price(Some(average)),
        change: format_percent(change),
    })
}

pub fn recommendation_view(result: &RecommendationResult) -> RecommendationView {
    let symbol = currency_symbol(&result.currency);
    let money = |v: f64| format_currency(Some(v), &symbol);

    let rows = result
        .recommendations
        .iter()
        .enumerate()
        .map(|(i, r)| RecommendationRow {
            rank: i + 1,
            ticker: r.ticker.clone(),
            last_price: money(r.last_price),
            momentum_6m: format_percent(r.momentum_6m),
            sharpe: format_ratio(r.sharpe),
            drawdown: format_percent(r.drawdown),
            weight: format_percent(Some(r.weight)),
            allocation: money(r.allocation),
            shares: format_shares(Some(r.shares)),
            cost: money(r.cost),
        })
        .collect();

    let order: Vec<&str> = result
        .recommendations
        .iter()
        .map(|r| r.ticker.as_str())
        .collect();

    RecommendationView {
        currency: result.currency.clone(),
        fx_rate: format_fx_rate(result.fx_rate, &result.currency),
        budget: money(result.budget),
        leftover: format_currency(result.leftover, &symbol),
        invested: money(result.total_cost()),
        total_weight: format_percent(Some(result.total_weight())),
        horizon: match result.horizon_months {
            1 => "1 month".to_string(),
            n => format!("{n} months"),
        },
        rows,
        chart: chart_view(&result.chart, &order),
    }
}

/// Series follow `order` (recommendation rank) first, then any remaining tickers
/// alphabetically.
pub fn chart_view(chart: &ChartPayload, order: &[&str]) -> ChartView {
    let labels = chart
        .dates
        .iter()
        .map(|d| date_label(d).to_string())
        .collect();

    let ranked = order.iter().copied().filter(|t| chart.series.contains_key(*t));
    let rest = chart
        .series
        .keys()
        .map(String::as_str)
        .filter(|t| !order.contains(t));

    let series = ranked
        .chain(rest)
        .map(|ticker| ChartSeries {
            ticker: ticker.to_string(),
            values: scale_series(&chart.series[ticker]),
        })
        .collect();

    ChartView { labels, series }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::{normalize_forecast, normalize_recommendation};
    use crate::present::format::PLACEHOLDER;
    use serde_json::json;

    #[test]
    fn forecast_cells_use_calendar_date_and_plain_price() {
        let result = normalize_forecast(json!({
            "forecast": [{"ds": "2024-01-01T00:00:00", "yhat": 172.34}],
            "explanation": "Trend up"
        }))
        .unwrap();

        let view = forecast_view(&result);
        assert_eq!(
            view.rows,
            vec![ForecastRow {
                date: "2024-01-01".to_string(),
                price: "172.34".to_string(),
            }]
        );
        assert_eq!(view.explanation, "Trend up");
        assert_eq!(result.points[0].date, "2024-01-01T00:00:00");
    }

    #[test]
    fn forecast_summary_averages_the_horizon() {
        let result = normalize_forecast(json!({
            "forecast": [
                {"ds": "2024-01-01", "yhat": 100.0},
                {"ds": "2024-01-02", "yhat": 105.0},
                {"ds": "2024-01-03", "yhat": 110.0}
            ]
        }))
        .unwrap();

        let summary = forecast_view(&result).summary.unwrap();
        assert_eq!(summary.days, 3);
        assert_eq!(summary.first, "100.00");
        assert_eq!(summary.last, "110.00");
        assert_eq!(summary.average, "105.00");
        assert_eq!(summary.change, "10.0%");
    }

    #[test]
    fn empty_forecast_has_no_summary() {
        let result = normalize_forecast(json!({"forecast": []})).unwrap();
        let view = forecast_view(&result);
        assert!(view.rows.is_empty());
        assert_eq!(view.summary, None);
    }

    fn recommendation_result() -> RecommendationResult {
        normalize_recommendation(json!({
            "currency": "EUR",
            "fx_rate_usd_per_eur": 1.0856,
            "budget_eur": 200,
            "leftover_eur": null,
            "horizon_months": 6,
            "recommendations": [
                {"ticker": "F", "last": 10.5, "momentum6m": 0.12, "sharpe": 1.234,
                 "drawdown": -0.2, "weight": 0.15, "alloc": 30.0, "shares": 2.8571, "cost": 29.99955},
                {"ticker": "AAPL", "last": 170.0, "weight": 0.85, "alloc": 170.0,
                 "shares": 1.0, "cost": 170.0}
            ],
            "chart": {
                "dates": ["2024-01-01T00:00:00", "2024-01-02T00:00:00"],
                "series": {"AAPL": [1.0, 1.1], "F": [1.0, 0.95], "BENCH": [1.0, 1.0]}
            }
        }))
        .unwrap()
    }

    #[test]
    fn recommendation_cells_are_formatted() {
        let view = recommendation_view(&recommendation_result());

        let f = &view.rows[0];
        assert_eq!(f.rank, 1);
        assert_eq!(f.ticker, "F");
        assert_eq!(f.weight, "15.0%");
        assert_eq!(f.last_price, "€10.50");
        assert_eq!(f.momentum_6m, "12.0%");
        assert_eq!(f.sharpe, "1.23");
        assert_eq!(f.drawdown, "-20.0%");
        assert_eq!(f.shares, "2.8571");
        assert_eq!(f.cost, "€30.00");

        let aapl = &view.rows[1];
        assert_eq!(aapl.momentum_6m, PLACEHOLDER);
        assert_eq!(aapl.sharpe, PLACEHOLDER);
        assert_eq!(aapl.drawdown, PLACEHOLDER);

        assert_eq!(view.budget, "€200.00");
        assert_eq!(view.invested, "€200.00");
        assert_eq!(view.total_weight, "100.0%");
        assert_eq!(view.fx_rate, "1 EUR = 1.0856 USD");
        assert_eq!(view.horizon, "6 months");
    }

    #[test]
    fn null_leftover_renders_placeholder() {
        let view = recommendation_view(&recommendation_result());
        assert_eq!(view.leftover, "–");
    }

    #[test]
    fn chart_follows_rank_then_alphabetical_order() {
        let result = recommendation_result();
        let view = recommendation_view(&result);

        assert_eq!(view.chart.labels, ["2024-01-01", "2024-01-02"]);
        let tickers: Vec<_> = view.chart.series.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(tickers, ["F", "AAPL", "BENCH"]);
        assert!((view.chart.series[1].values[1] - 110.0).abs() < 1e-9);

        // Stored series stay on the 1.0 index scale.
        assert_eq!(result.chart.series["AAPL"], vec![1.0, 1.1]);
    }

    #[test]
    fn empty_chart_gives_empty_view() {
        let view = chart_view(&ChartPayload::default(), &["F"]);
        assert_eq!(view, ChartView::default());
    }
}
