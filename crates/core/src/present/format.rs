/// Shown in place of a missing or non-finite number.
pub const PLACEHOLDER: &str = "–";

const SHARE_DECIMALS: i32 = 4;

pub fn currency_symbol(currency: &str) -> String {
    match currency.trim().to_uppercase().as_str() {
        "EUR" => "€".to_string(),
        "USD" => "$".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        "" => String::new(),
        other => format!("{other} "),
    }
}

/// `Some(1234.5)` with `"€"` → `"€1234.50"`; negatives put the sign before the symbol.
pub fn format_currency(amount: Option<f64>, symbol: &str) -> String {
    let Some(v) = finite(amount) else {
        return PLACEHOLDER.to_string();
    };
    let digits = fixed(v.abs(), 2);
    if v < 0.0 && digits != fixed(0.0, 2) {
        format!("-{symbol}{digits}")
    } else {
        format!("{symbol}{digits}")
    }
}

/// Two decimals, no symbol.
pub fn format_price(amount: Option<f64>) -> String {
    finite(amount).map_or_else(|| PLACEHOLDER.to_string(), |v| fixed(v, 2))
}

/// Fraction to percent with one decimal: `0.15` → `"15.0%"`.
pub fn format_percent(fraction: Option<f64>) -> String {
    match finite(fraction).map(|v| v * 100.0).filter(|v| v.is_finite()) {
        Some(pct) => format!("{}%", fixed(pct, 1)),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_ratio(value: Option<f64>) -> String {
    finite(value).map_or_else(|| PLACEHOLDER.to_string(), |v| fixed(v, 2))
}

/// Floors to four decimals so a fractional position is never overstated.
pub fn format_shares(shares: Option<f64>) -> String {
    let Some(v) = finite(shares) else {
        return PLACEHOLDER.to_string();
    };
    let scale = 10f64.powi(SHARE_DECIMALS);
    // The nudge keeps values such as 0.5882 (stored as 0.58819999...) from flooring down a step.
    let floored = ((v * scale) + 1e-7).floor() / scale;
    fixed(floored, SHARE_DECIMALS as usize)
}

/// `1 EUR = 1.0856 USD`.
pub fn format_fx_rate(usd_per_unit: Option<f64>, currency: &str) -> String {
    match finite(usd_per_unit) {
        Some(rate) => format!("1 {currency} = {} USD", fixed(rate, 4)),
        None => PLACEHOLDER.to_string(),
    }
}

/// Index series to display scale, `1.0` → `100.0`. Returns a new vector.
pub fn scale_series(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v * 100.0).collect()
}

/// Calendar-date part of a timestamp: `"2024-01-01T00:00:00"` → `"2024-01-01"`.
pub fn date_label(timestamp: &str) -> &str {
    let trimmed = timestamp.trim();
    trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed)
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite())
}

// Fixed-point without a "-0.00".
fn fixed(v: f64, decimals: usize) -> String {
    let s = format!("{v:.decimals$}");
    match s.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => s,
    }
}
