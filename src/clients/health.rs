use std::{collections::HashMap, time::Instant};

use anyhow::{Error, Result};
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{
    clients::build_http_client,
    config::Config,
    models::health::{HealthCheckResponse, HealthStatus, ServiceHealth},
};

pub struct HealthChecker {
    http_client: Client,
    base_url: String,
    anon_key: String,
}

impl HealthChecker {
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            http_client: build_http_client(config)?,
            base_url: config.base_url().to_string(),
            anon_key: config.backend_anon_key.clone(),
        })
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let mut checks = HashMap::new();

        let auth_health = self.check_endpoint("auth_service", "/auth/v1/health").await;
        checks.insert("auth_service".to_string(), auth_health);

        let store_health = self.check_endpoint("record_store", "/rest/v1/").await;
        checks.insert("record_store".to_string(), store_health);

        let overall_status = self.determine_overall_status(&checks);

        HealthCheckResponse {
            status: overall_status,
            timestamp: Utc::now(),
            checks,
        }
    }

    async fn check_endpoint(&self, service: &str, path: &str) -> ServiceHealth {
        let start = Instant::now();

        let response = self
            .http_client
            .get(format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .send()
            .await;

        let elapsed = start.elapsed().as_millis() as u64;

        match response {
            Ok(response) if response.status().is_success() => {
                debug!(service, response_time_ms = elapsed, "Health check passed");
                ServiceHealth::healthy(elapsed)
            }
            Ok(response) => {
                warn!(service, status = %response.status(), "Health check returned an error status");
                ServiceHealth::degraded(elapsed, format!("Returned status {}", response.status()))
            }
            Err(e) => {
                warn!(service, error = %e, "Health check request failed");
                ServiceHealth::unhealthy(format!("Connection failed: {}", e))
            }
        }
    }

    fn determine_overall_status(&self, checks: &HashMap<String, ServiceHealth>) -> HealthStatus {
        let has_unhealthy = checks
            .values()
            .any(|health| health.status == HealthStatus::Unhealthy);

        let has_degraded = checks
            .values()
            .any(|health| health.status == HealthStatus::Degraded);

        if has_unhealthy {
            HealthStatus::Unhealthy
        } else if has_degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}
