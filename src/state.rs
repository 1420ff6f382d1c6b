use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api::LegalApi;
use crate::map::viewport::CanvasSize;
use crate::pipeline::QueryPipeline;

/// Cosmetic progress ticker settings.
#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    pub step: u8,
    pub interval: Duration,
    pub cap: u8,
    /// Pause between reaching 100% and handing the result to the view.
    pub result_delay: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            step: 2,
            interval: Duration::from_millis(200),
            cap: 90,
            result_delay: Duration::from_millis(500),
        }
    }
}

impl ProgressConfig {
    /// A zero step or interval would make the ticker spin without moving.
    pub fn validate(&self) -> Result<()> {
        if self.step == 0 {
            anyhow::bail!("PROGRESS_STEP must be greater than zero");
        }
        if self.interval.is_zero() {
            anyhow::bail!("PROGRESS_INTERVAL_MS must be greater than zero");
        }
        Ok(())
    }
}

pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub progress: ProgressConfig,
    pub canvas: CanvasSize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(60),
            progress: ProgressConfig::default(),
            canvas: CanvasSize::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by environment (and `.env`) values.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let api_base_url =
            dotenv::var("LEGAL_API_BASE_URL").unwrap_or(defaults.api_base_url);
        let request_timeout = Duration::from_secs(env_or("LEGAL_API_TIMEOUT_SECS", 60)?);

        let progress = ProgressConfig {
            step: env_or("PROGRESS_STEP", defaults.progress.step)?,
            interval: Duration::from_millis(env_or("PROGRESS_INTERVAL_MS", 200)?),
            cap: env_or::<u8>("PROGRESS_CAP", defaults.progress.cap)?.min(100),
            result_delay: Duration::from_millis(env_or("RESULT_DELAY_MS", 500)?),
        };
        progress.validate()?;

        Ok(Self {
            api_base_url,
            request_timeout,
            progress,
            canvas: defaults.canvas,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenv::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

pub struct AppState {
    pub api: Arc<dyn LegalApi>,
    pub pipeline: Arc<QueryPipeline>,
    pub config: ClientConfig,
}

impl AppState {
    pub fn new(api: Arc<dyn LegalApi>, config: ClientConfig) -> Self {
        let pipeline = Arc::new(QueryPipeline::new(api.clone(), config.progress));
        Self {
            api,
            pipeline,
            config,
        }
    }
}
