use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub interview: InterviewConfig,
    pub rehearsal: RehearsalConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Client-side settings for driving an interview
#[derive(Debug, Deserialize)]
pub struct InterviewConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub max_recording_secs: u32,
    pub tick_interval_ms: u64,
    pub detection_interval_ms: u64,
    pub perfect_score_marker: String,
}

/// Canned interview served by the rehearsal server
#[derive(Debug, Deserialize)]
pub struct RehearsalConfig {
    pub questions: Vec<String>,
    pub transcript: String,
    pub feedback: String,
}

impl Config {
    /// Load `<path>.toml` (or any format `config` recognises), with
    /// `LIVE_INTERVIEW__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("LIVE_INTERVIEW").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}
