use crate::config::Config;
use crate::errors::ProbeError;
use crate::metrics::{normalize, MetricsSource};
use crate::status::{evaluate, perf_data, StatusReport, Threshold};

/// Run one evaluation cycle. Never fails: every error becomes an UNKNOWN
/// report so the caller always has exactly one line to print.
pub async fn run(config: &Config, source: &dyn MetricsSource) -> StatusReport {
    match check(config, source).await {
        Ok(report) => report,
        Err(err) => StatusReport::unknown(err.to_string()),
    }
}

async fn check(config: &Config, source: &dyn MetricsSource) -> Result<StatusReport, ProbeError> {
    let request = config.request()?;
    tracing::debug!(?request, "validated request");

    let table = source.fetch_metrics(&request.api_key).await?;
    tracing::debug!(applications = table.len(), "fetched metrics table");

    let samples = table
        .get(&request.application_name)
        .ok_or_else(|| ProbeError::UnknownApplication {
            name: request.application_name.clone(),
        })?;

    let display_name = request.metric.display_name();
    let sample = samples
        .get(display_name)
        .ok_or_else(|| ProbeError::MissingMetric {
            application: request.application_name.clone(),
            metric: display_name.to_string(),
        })?;

    // Measured value and both thresholds share the metric's data type and
    // scaling, otherwise the comparison is apples to oranges.
    let data_type = request.metric.data_type();
    let measured = normalize(&sample.raw_value, data_type, "metric value")?;
    let warning = Threshold {
        normalized: normalize(&request.warning_threshold, data_type, "-w")?,
        raw: request.warning_threshold.clone(),
    };
    let critical = Threshold {
        normalized: normalize(&request.critical_threshold, data_type, "-c")?,
        raw: request.critical_threshold.clone(),
    };

    let label = format!("{}_{}", request.application_name, display_name);
    let perf = perf_data(
        &label,
        &sample.raw_value,
        &request.warning_threshold,
        &request.critical_threshold,
    );
    tracing::debug!(%perf, measured, "evaluating");

    Ok(evaluate(
        measured,
        &warning,
        &critical,
        &sample.formatted_value,
        display_name,
        &perf,
    ))
}
