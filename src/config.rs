use clap::Parser;
use std::time::Duration;

use crate::errors::ProbeError;
use crate::metrics::MetricKind;

#[derive(Parser, Debug, Clone)]
#[command(name = "check-newrelic", version, about)]
pub struct Config {
    /// Warning threshold in the metric's native unit.
    #[arg(short = 'w', long = "warning", default_value = "0")]
    pub warning_threshold: String,

    /// Critical threshold in the metric's native unit.
    #[arg(short = 'c', long = "critical", default_value = "0")]
    pub critical_threshold: String,

    /// Application name exactly as registered in NewRelic.
    #[arg(short = 'a', long = "app", env = "NEWRELIC_APP_NAME")]
    pub application_name: Option<String>,

    /// Metric to check: cpu, memory, errors, response, throughput or db.
    #[arg(short = 'm', long = "metric")]
    pub metric: Option<String>,

    /// NewRelic API license key.
    #[arg(short = 'k', long = "api-key", env = "NEWRELIC_API_KEY")]
    pub api_key: Option<String>,

    /// HTTP request timeout in milliseconds.
    #[arg(long, env = "CHECK_NEWRELIC_TIMEOUT_MS", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Enable debug logging on stderr.
    #[arg(short = 'd', long, default_value_t = false)]
    pub debug: bool,
}

/// Fully validated inputs for one evaluation cycle.
#[derive(Debug, Clone)]
pub struct MetricRequest {
    pub application_name: String,
    pub metric: MetricKind,
    pub api_key: String,
    pub warning_threshold: String,
    pub critical_threshold: String,
}

impl Config {
    /// Validate the required flags and resolve the metric selector.
    ///
    /// Required flags are Option<String> rather than clap-required so their
    /// absence reaches the UNKNOWN path (exit 3) instead of clap's usage
    /// error, which the monitoring supervisor would misread.
    pub fn request(&self) -> Result<MetricRequest, ProbeError> {
        let application_name = require(&self.application_name, "--app")?;
        let raw_metric = require(&self.metric, "--metric")?;
        let api_key = require(&self.api_key, "--api-key")?;

        let metric = MetricKind::parse(&raw_metric).ok_or_else(|| ProbeError::InvalidMetric {
            raw: raw_metric.clone(),
        })?;

        Ok(MetricRequest {
            application_name,
            metric,
            api_key,
            warning_threshold: self.warning_threshold.clone(),
            critical_threshold: self.critical_threshold.clone(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn require(value: &Option<String>, flag: &'static str) -> Result<String, ProbeError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(ProbeError::MissingArgument { flag }),
    }
}
