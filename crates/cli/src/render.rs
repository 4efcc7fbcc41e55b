use chrono::{DateTime, Utc};
use serde::Serialize;
use smartfolio_core::domain::forecast::ForecastResult;
use smartfolio_core::domain::recommendation::RecommendationResult;
use smartfolio_core::orchestrator::{PipelineSnapshot, RequestState};
use smartfolio_core::present::{
    forecast_view, recommendation_view, ChartView, ForecastView, RecommendationView,
};
use std::fmt::Write;

const SPARK_TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Serialize)]
struct PipelineOutput<V> {
    status: &'static str,
    sequence: u64,
    settled_at: Option<DateTime<Utc>>,
    error: Option<String>,
    view: Option<V>,
}

#[derive(Debug, Serialize)]
struct DashboardOutput {
    forecast: PipelineOutput<ForecastView>,
    recommendation: PipelineOutput<RecommendationView>,
}

fn output<T, V>(snap: &PipelineSnapshot<T>, derive: impl Fn(&T) -> V) -> PipelineOutput<V> {
    let (status, error, view) = match &snap.state {
        RequestState::Idle => ("idle", None, None),
        RequestState::Pending => ("pending", None, None),
        RequestState::Succeeded(v) => ("succeeded", None, Some(derive(v))),
        RequestState::Failed(reason) => ("failed", Some(reason.clone()), None),
    };
    PipelineOutput {
        status,
        sequence: snap.sequence,
        settled_at: snap.settled_at,
        error,
        view,
    }
}

pub fn forecast(
    ticker: &str,
    snap: &PipelineSnapshot<ForecastResult>,
    json: bool,
) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&output(snap, forecast_view))? + "\n");
    }
    Ok(forecast_text(ticker, snap))
}

pub fn recommendation(
    snap: &PipelineSnapshot<RecommendationResult>,
    json: bool,
) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&output(snap, recommendation_view))? + "\n");
    }
    Ok(recommendation_text(snap))
}

pub fn dashboard(
    ticker: &str,
    forecast_snap: &PipelineSnapshot<ForecastResult>,
    recommend_snap: &PipelineSnapshot<RecommendationResult>,
    json: bool,
) -> anyhow::Result<String> {
    if json {
        let out = DashboardOutput {
            forecast: output(forecast_snap, forecast_view),
            recommendation: output(recommend_snap, recommendation_view),
        };
        return Ok(serde_json::to_string_pretty(&out)? + "\n");
    }
    Ok(format!(
        "{}\n{}",
        forecast_text(ticker, forecast_snap),
        recommendation_text(recommend_snap)
    ))
}

fn forecast_text(ticker: &str, snap: &PipelineSnapshot<ForecastResult>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Forecast {} ==", ticker.trim().to_uppercase());
    match &snap.state {
        RequestState::Succeeded(r) => write_forecast(&mut out, &forecast_view(r)),
        other => write_status(&mut out, other),
    }
    out
}

fn recommendation_text(snap: &PipelineSnapshot<RecommendationResult>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== Portfolio recommendation ==");
    match &snap.state {
        RequestState::Succeeded(r) => write_recommendation(&mut out, &recommendation_view(r)),
        other => write_status(&mut out, other),
    }
    out
}

fn write_status<T>(out: &mut String, state: &RequestState<T>) {
    let _ = match state {
        RequestState::Idle => writeln!(out, "(no request yet)"),
        RequestState::Pending => writeln!(out, "loading…"),
        RequestState::Failed(reason) => writeln!(out, "error: {reason}"),
        RequestState::Succeeded(_) => Ok(()),
    };
}

fn write_forecast(out: &mut String, view: &ForecastView) {
    if view.rows.is_empty() {
        let _ = writeln!(out, "(no forecast points returned)");
    } else {
        let rows: Vec<Vec<String>> = view
            .rows
            .iter()
            .map(|r| vec![r.date.clone(), r.price.clone()])
            .collect();
        out.push_str(&table(&["Date", "Price"], &rows));
    }

    if let Some(s) = &view.summary {
        let _ = writeln!(
            out,
            "{} days: first {}, last {}, average {}, change {}",
            s.days, s.first, s.last, s.average, s.change
        );
    }
    let _ = writeln!(out, "Explanation: {}", view.explanation);
}

fn write_recommendation(out: &mut String, view: &RecommendationView) {
    let _ = writeln!(
        out,
        "Budget {} over {} | invested {} ({}) | leftover {} | FX {}",
        view.budget, view.horizon, view.invested, view.total_weight, view.leftover, view.fx_rate
    );

    if view.rows.is_empty() {
        let _ = writeln!(out, "(no recommendations returned)");
    } else {
        let rows: Vec<Vec<String>> = view
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.rank.to_string(),
                    r.ticker.clone(),
                    r.last_price.clone(),
                    r.momentum_6m.clone(),
                    r.sharpe.clone(),
                    r.drawdown.clone(),
                    r.weight.clone(),
                    r.allocation.clone(),
                    r.shares.clone(),
                    r.cost.clone(),
                ]
            })
            .collect();
        out.push_str(&table(
            &[
                "#", "Ticker", "Last", "Mom 6m", "Sharpe", "Drawdown", "Weight", "Alloc",
                "Shares", "Cost",
            ],
            &rows,
        ));
    }

    write_chart(out, &view.chart);
}

fn write_chart(out: &mut String, chart: &ChartView) {
    if chart.series.is_empty() || chart.labels.is_empty() {
        return;
    }
    let first = chart.labels.first().map(String::as_str).unwrap_or_default();
    let last = chart.labels.last().map(String::as_str).unwrap_or_default();
    let _ = writeln!(out, "Index (100 = start), {first} .. {last}");

    let width = chart
        .series
        .iter()
        .map(|s| s.ticker.chars().count())
        .max()
        .unwrap_or(0);
    for s in &chart.series {
        let end = s
            .values
            .last()
            .map(|v| format!("{v:.1}"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<width$}  {}  {end}",
            s.ticker,
            sparkline(&s.values)
        );
    }
}

fn sparkline(values: &[f64]) -> String {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let top = (SPARK_TICKS.len() - 1) as f64;

    values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                ' '
            } else if max - min <= f64::EPSILON {
                SPARK_TICKS[SPARK_TICKS.len() / 2]
            } else {
                SPARK_TICKS[(((v - min) / (max - min)) * top).round() as usize]
            }
        })
        .collect()
}

/// First column left-aligned, the rest right-aligned.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    for row in std::iter::once(&header).chain(rows.iter()) {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, w))| pad(cell, *w, i == 0))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out
}

// `format!` width counts chars, which is what we want for "€" and "–".
fn pad(cell: &str, width: usize, left: bool) -> String {
    if left {
        format!("{cell:<width$}")
    } else {
        format!("{cell:>width$}")
    }
}
