pub mod newrelic;

use crate::errors::ProbeError;
use async_trait::async_trait;
use std::collections::HashMap;

/// The six metric selectors the probe understands. Each maps to the display
/// name NewRelic uses as the key inside its application_health payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Cpu,
    Memory,
    Errors,
    Response,
    Throughput,
    Db,
}

/// How the raw value string should be read before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Float,
    Int,
}

impl MetricKind {
    /// Resolve a user-supplied selector, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "cpu" => Some(MetricKind::Cpu),
            "memory" => Some(MetricKind::Memory),
            "errors" => Some(MetricKind::Errors),
            "response" => Some(MetricKind::Response),
            "throughput" => Some(MetricKind::Throughput),
            "db" => Some(MetricKind::Db),
            _ => None,
        }
    }

    /// Key used inside the NewRelic response payload.
    pub fn display_name(self) -> &'static str {
        match self {
            MetricKind::Cpu => "Cpu",
            MetricKind::Memory => "Memory",
            MetricKind::Errors => "Errors",
            MetricKind::Response => "Response Time",
            MetricKind::Throughput => "Throughput",
            MetricKind::Db => "Db",
        }
    }

    /// Response Time arrives as an integer millisecond count; everything
    /// else is a float-formatted percentage or rate.
    pub fn data_type(self) -> DataType {
        match self {
            MetricKind::Response => DataType::Int,
            _ => DataType::Float,
        }
    }
}

/// One metric as reported for one application.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Human-readable value, e.g. "45.2 %", used in the status message.
    pub formatted_value: String,
    /// Numeric value as a string, possibly fractional, used for comparison.
    pub raw_value: String,
}

/// Application name -> metric display name -> sample. Built once per
/// invocation and read-only afterwards.
pub type MetricsTable = HashMap<String, HashMap<String, MetricSample>>;

/// Seam between the controller and whatever serves the metrics. The real
/// implementation talks to NewRelic; tests inject an in-memory table.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch_metrics(&self, api_key: &str) -> Result<MetricsTable, ProbeError>;
}

/// Convert a raw value string into the integer used for comparison.
///
/// Float-typed values are scaled to thousandths so three decimal digits
/// survive without comparing floats; int-typed values are truncated toward
/// zero. The same scaling must be applied to the measured value and to both
/// thresholds or the comparison is meaningless.
///
/// Unparseable input is an error rather than a silent zero: a mistyped
/// threshold reporting OK forever is worse than an UNKNOWN.
pub fn normalize(raw: &str, data_type: DataType, field: &str) -> Result<i64, ProbeError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ProbeError::InvalidNumber {
            field: field.to_string(),
            raw: raw.to_string(),
        })?;

    let scaled = match data_type {
        DataType::Float => value * 1000.0,
        DataType::Int => value,
    };
    Ok(scaled.trunc() as i64)
}
