use std::fmt;

/// Nagios plugin states, in severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// Exit code the monitoring supervisor keys off.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// The one line this probe is allowed to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: Status,
    pub message: String,
}

impl StatusReport {
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            status: Status::Unknown,
            message: message.into(),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

/// An operator-supplied threshold together with its normalized form. The raw
/// string is what goes into messages and perf data; the normalized value is
/// what comparisons use.
#[derive(Debug, Clone)]
pub struct Threshold {
    pub raw: String,
    pub normalized: i64,
}

/// Nagios perf data: 'label'=value[UOM];[warn];[crit];[min];[max].
/// Min and max are always left empty; warn and crit are the raw threshold
/// strings as supplied, so graphing consumers see the operator's units.
pub fn perf_data(label: &str, value: &str, warn: &str, crit: &str) -> String {
    format!("{}={};{};{};;", label.replace(' ', "_"), value, warn, crit)
}

/// Decide the plugin state for a measured value.
///
/// Critical is checked before warning. Thresholds are never validated to be
/// ordered, so a value above both must hit the critical branch first.
/// Equality to a threshold is not a breach.
pub fn evaluate(
    measured: i64,
    warning: &Threshold,
    critical: &Threshold,
    display_value: &str,
    metric_label: &str,
    perf_data: &str,
) -> StatusReport {
    if measured > critical.normalized {
        return StatusReport {
            status: Status::Critical,
            message: format!(
                "{} returned for {} exceeds threshold of {} {}",
                display_value, metric_label, critical.raw, perf_data
            ),
        };
    }

    if measured > warning.normalized {
        return StatusReport {
            status: Status::Warning,
            message: format!(
                "{} returned for {} exceeds threshold of {} {}",
                display_value, metric_label, warning.raw, perf_data
            ),
        };
    }

    StatusReport {
        status: Status::Ok,
        message: format!("{} returned for {} | {}", display_value, metric_label, perf_data),
    }
}
