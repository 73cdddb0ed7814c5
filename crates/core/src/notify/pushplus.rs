use crate::config::{env_or, Settings};
use crate::error::PickError;
use crate::notify::Notifier;
use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://www.pushplus.plus";
const SEND_PATH: &str = "/send";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const TEMPLATE: &str = "markdown";

/// PushPlus webhook (WeChat delivery).
#[derive(Debug, Clone)]
pub struct PushPlusNotifier {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PushPlusNotifier {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let token = settings.require_pushplus_token()?.to_string();
        let base_url = settings
            .pushplus_base_url
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env_or("PUSHPLUS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        Self::new(base_url, token, Duration::from_secs(timeout_secs))
    }

    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build pushplus http client")?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    async fn send(&self, title: &str, body: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), SEND_PATH);
        let res = self
            .http
            .get(url)
            .query(&[
                ("token", self.token.as_str()),
                ("title", title),
                ("content", body),
                ("template", TEMPLATE),
            ])
            .send()
            .await
            .context("pushplus request failed")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("pushplus HTTP {status}: {text}");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for PushPlusNotifier {
    fn channel_name(&self) -> &'static str {
        "pushplus"
    }

    async fn notify(&self, title: &str, body: &str) -> Result<(), PickError> {
        match self.send(title, body).await {
            Ok(()) => {
                tracing::info!(channel = self.channel_name(), %title, "notification sent");
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    channel = self.channel_name(),
                    %title,
                    error = %format!("{err:#}"),
                    "notification failed"
                );
                Err(PickError::Notification(err))
            }
        }
    }
}
