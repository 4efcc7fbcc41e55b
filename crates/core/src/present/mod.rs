//! Display-ready derivations from normalized results. Nothing here fails and
//! nothing mutates its input.

pub mod format;
pub mod view;

pub use format::{
    currency_symbol, date_label, format_currency, format_fx_rate, format_percent, format_price,
    format_ratio, format_shares, scale_series, PLACEHOLDER,
};
pub use view::{
    chart_view, forecast_view, recommendation_view, ChartSeries, ChartView, ForecastRow,
    ForecastSummary, ForecastView, RecommendationRow, RecommendationView,
};
