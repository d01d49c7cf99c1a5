use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub backend_url: String,
    pub backend_anon_key: String,

    #[serde(default = "default_templates_table")]
    pub templates_table: String,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_analysis_debounce_ms")]
    pub analysis_debounce_ms: u64,

    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

fn default_templates_table() -> String {
    "templates".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_analysis_debounce_ms() -> u64 {
    300
}

fn default_server_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        Ok(config)
    }

    /// Configuration pointing at an explicit backend, with defaults elsewhere.
    pub fn for_backend(backend_url: impl Into<String>, backend_anon_key: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            backend_anon_key: backend_anon_key.into(),
            templates_table: default_templates_table(),
            request_timeout_seconds: default_request_timeout_seconds(),
            analysis_debounce_ms: default_analysis_debounce_ms(),
            server_port: default_server_port(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn analysis_debounce(&self) -> Duration {
        Duration::from_millis(self.analysis_debounce_ms)
    }
}
