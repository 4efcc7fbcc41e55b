use clap::{Parser, Subcommand};
use smartfolio_core::client::http::HttpTransport;
use smartfolio_core::config::Settings;
use smartfolio_core::input::{parse_amount, parse_count};
use smartfolio_core::orchestrator::{Orchestrator, RequestState};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Debug, Parser)]
#[command(name = "smartfolio", about = "Stock forecasts and budget portfolio recommendations")]
struct Args {
    /// Service base URL, e.g. http://10.0.0.5:8000/api. Overrides API_BASE_URL.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Give up on a request after this many seconds. Overrides API_TIMEOUT_SECS.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Print the display data as JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Price forecast for one ticker.
    Forecast(ForecastArgs),
    /// Portfolio recommendation for a budget.
    Recommend(RecommendArgs),
    /// Forecast and recommendation side by side.
    Dashboard {
        #[command(flatten)]
        forecast: ForecastArgs,
        #[command(flatten)]
        recommend: RecommendArgs,
    },
}

#[derive(Debug, clap::Args)]
struct ForecastArgs {
    #[arg(long)]
    ticker: String,

    #[arg(long, default_value = "30", value_parser = |s: &str| parse_count("days", s))]
    days: i64,
}

#[derive(Debug, clap::Args)]
struct RecommendArgs {
    /// Budget in EUR.
    #[arg(long, value_parser = |s: &str| parse_amount("budget", s))]
    budget: f64,

    #[arg(long, default_value = "6", value_parser = |s: &str| parse_count("months", s))]
    months: i64,

    /// Number of positions. Defaults to DEFAULT_TOP_N (10).
    #[arg(long, value_parser = |s: &str| parse_count("top_n", s))]
    top_n: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = load_settings(&args, |key| std::env::var(key).ok())?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let transport = match HttpTransport::from_settings(&settings) {
        Ok(t) => t,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "configuration error");
            return Err(e);
        }
    };
    tracing::debug!(base_url = transport.base_url(), "service configured");

    let orch = Orchestrator::new(Arc::new(transport)).with_timeout(settings.api_timeout());

    tokio::select! {
        code = run(&orch, args, settings.default_top_n) => code,
        _ = shutdown_signal() => {
            tracing::warn!("interrupted");
            Ok(ExitCode::from(130))
        }
    }
}

/// Command-line flags shadow the matching environment keys.
fn load_settings(
    args: &Args,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    Settings::from_lookup(|key| match key {
        "API_BASE_URL" if args.base_url.is_some() => args.base_url.clone(),
        "API_TIMEOUT_SECS" if args.timeout_secs.is_some() => {
            args.timeout_secs.map(|secs| secs.to_string())
        }
        _ => env(key),
    })
}

async fn run(orch: &Orchestrator, args: Args, default_top_n: u32) -> anyhow::Result<ExitCode> {
    let top_n = |r: &RecommendArgs| r.top_n.unwrap_or(i64::from(default_top_n));

    let mut out = String::new();
    let failed = match &args.command {
        Command::Forecast(f) => {
            orch.submit_forecast(&f.ticker, f.days).await;
            let snap = orch.forecast_snapshot();
            out.push_str(&render::forecast(&f.ticker, &snap, args.json)?);
            is_failed(&snap.state)
        }
        Command::Recommend(r) => {
            orch.submit_recommend(r.budget, r.months, top_n(r)).await;
            let snap = orch.recommend_snapshot();
            out.push_str(&render::recommendation(&snap, args.json)?);
            is_failed(&snap.state)
        }
        Command::Dashboard {
            forecast: f,
            recommend: r,
        } => {
            tokio::join!(
                orch.submit_forecast(&f.ticker, f.days),
                orch.submit_recommend(r.budget, r.months, top_n(r)),
            );
            let f_snap = orch.forecast_snapshot();
            let r_snap = orch.recommend_snapshot();
            out.push_str(&render::dashboard(&f.ticker, &f_snap, &r_snap, args.json)?);
            is_failed(&f_snap.state) || is_failed(&r_snap.state)
        }
    };

    print!("{out}");
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn is_failed<T>(state: &RequestState<T>) -> bool {
    matches!(state, RequestState::Failed(_))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; never resolve.
        std::future::pending::<()>().await;
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_malformed_environment() {
        let args = Args::try_parse_from([
            "smartfolio",
            "--base-url",
            "http://localhost:8000",
            "--timeout-secs",
            "20",
            "forecast",
            "--ticker",
            "AAPL",
        ])
        .unwrap();
        let env = |key: &str| match key {
            "API_BASE_URL" => Some("not a url".to_string()),
            "API_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => None,
        };

        let settings = load_settings(&args, env).unwrap();
        assert_eq!(settings.require_api_base_url().unwrap(), "http://localhost:8000");
        assert_eq!(settings.api_timeout_secs, Some(20));
    }

    #[test]
    fn malformed_environment_without_flag_is_an_error() {
        let args = Args::try_parse_from(["smartfolio", "forecast", "--ticker", "AAPL"]).unwrap();
        let err = load_settings(&args, |key| {
            (key == "API_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("API_TIMEOUT_SECS"));
    }

    #[test]
    fn parses_dashboard_arguments() {
        let args = Args::try_parse_from([
            "smartfolio",
            "--base-url",
            "http://localhost:8000",
            "dashboard",
            "--ticker",
            "aapl",
            "--days",
            "5",
            "--budget",
            "200",
        ])
        .unwrap();

        assert_eq!(args.base_url.as_deref(), Some("http://localhost:8000"));
        let Command::Dashboard { forecast, recommend } = args.command else {
            panic!("expected dashboard");
        };
        assert_eq!(forecast.ticker, "aapl");
        assert_eq!(forecast.days, 5);
        assert_eq!(recommend.budget, 200.0);
        assert_eq!(recommend.months, 6);
        assert_eq!(recommend.top_n, None);
    }

    #[test]
    fn fractional_counts_are_rejected_at_parse_time() {
        let res = Args::try_parse_from(["smartfolio", "forecast", "--ticker", "AAPL", "--days", "2.5"]);
        assert!(res.is_err());

        let res = Args::try_parse_from(["smartfolio", "recommend", "--budget", "abc"]);
        assert!(res.is_err());
    }

    #[test]
    fn non_positive_counts_parse_and_are_left_to_the_validator() {
        let args =
            Args::try_parse_from(["smartfolio", "forecast", "--ticker", "AAPL", "--days", "0"])
                .unwrap();
        let Command::Forecast(f) = args.command else {
            panic!("expected forecast");
        };
        assert_eq!(f.days, 0);
    }
}
