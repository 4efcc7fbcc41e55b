pub mod client;
pub mod domain;
pub mod input;
pub mod orchestrator;
pub mod present;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_TOP_N: u32 = 10;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub api_base_url: Option<String>,
        pub api_timeout_secs: Option<u64>,
        pub sentry_dsn: Option<String>,
        pub default_top_n: u32,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        /// Builds settings from an arbitrary key lookup. Unset or blank keys fall
        /// back to their defaults; a set value that does not parse is an error.
        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

            let api_timeout_secs = get("API_TIMEOUT_SECS")
                .map(|s| parse_var::<u64>("API_TIMEOUT_SECS", &s))
                .transpose()?;

            let default_top_n = match get("DEFAULT_TOP_N") {
                Some(s) => {
                    let n = parse_var::<u32>("DEFAULT_TOP_N", &s)?;
                    anyhow::ensure!(n > 0, "DEFAULT_TOP_N must be positive (got {n})");
                    n
                }
                None => DEFAULT_TOP_N,
            };

            Ok(Self {
                api_base_url: get("API_BASE_URL"),
                api_timeout_secs,
                sentry_dsn: get("SENTRY_DSN"),
                default_top_n,
            })
        }

        /// The forecast/recommendation service address. There is no built-in
        /// fallback; a missing value is a startup error.
        pub fn require_api_base_url(&self) -> anyhow::Result<&str> {
            let base_url = self
                .api_base_url
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .context("API_BASE_URL is required")?;
            anyhow::ensure!(
                base_url.starts_with("http://") || base_url.starts_with("https://"),
                "API_BASE_URL must be an http(s) URL (got {base_url})"
            );
            Ok(base_url)
        }

        pub fn api_timeout(&self) -> Option<Duration> {
            self.api_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
        }
    }

    fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> anyhow::Result<T>
    where
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        raw.trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a non-negative integer (got {raw:?})"))
    }

}
