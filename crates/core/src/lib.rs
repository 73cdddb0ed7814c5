pub mod allocate;
pub mod cache;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod render;
pub mod select;
pub mod symbol;
pub mod time;

pub use error::PickError;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub pushplus_token: Option<String>,
        pub pushplus_base_url: Option<String>,
        pub report_base_url: Option<String>,
        pub quote_base_url: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                pushplus_token: std::env::var("PUSHPLUS_TOKEN").ok(),
                pushplus_base_url: std::env::var("PUSHPLUS_BASE_URL").ok(),
                report_base_url: std::env::var("REPORT_BASE_URL").ok(),
                quote_base_url: std::env::var("QUOTE_BASE_URL").ok(),
            })
        }

        pub fn require_pushplus_token(&self) -> anyhow::Result<&str> {
            self.pushplus_token
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .context("PUSHPLUS_TOKEN is required")
        }
    }

    /// Reads a numeric env override, falling back when unset or unparsable.
    pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
        std::env::var(key)
            .ok()
            .and_then(|s| s.trim().parse::<T>().ok())
            .unwrap_or(default)
    }
}
