use super::{MetricSample, MetricsSource, MetricsTable};
use crate::errors::ProbeError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://rpm.newrelic.com";

/// Header NewRelic expects the license key in.
const LICENSE_KEY_HEADER: &str = "x-license-key";

const METRICS_PATH: &str = "/accounts.json?include=application_health";

/// Account summary payload. One account, its applications, and the current
/// health metrics per application.
#[derive(Debug, Deserialize)]
struct AccountsResponse {
    accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
struct Account {
    applications: Vec<Application>,
}

#[derive(Debug, Deserialize)]
struct Application {
    name: String,
    threshold_values: Vec<ThresholdValue>,
}

#[derive(Debug, Deserialize)]
struct ThresholdValue {
    name: String,
    formatted_metric_value: String,
    metric_value: RawNumber,
}

/// The API formats metric_value as a bare number for some metrics and as a
/// string for others, so accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Number(f64),
}

impl RawNumber {
    fn into_string(self) -> String {
        match self {
            RawNumber::Text(s) => s,
            RawNumber::Number(n) => n.to_string(),
        }
    }
}

/// Read-only client for the NewRelic account metrics endpoint. One GET per
/// invocation, no retries, no caching.
pub struct NewRelicClient {
    http: reqwest::Client,
    base_url: String,
}

impl NewRelicClient {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        Self::with_base_url(timeout, DEFAULT_BASE_URL)
    }

    /// Point the client somewhere other than the production API.
    pub fn with_base_url(timeout: Duration, base_url: impl Into<String>) -> Result<Self, ProbeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MetricsSource for NewRelicClient {
    async fn fetch_metrics(&self, api_key: &str) -> Result<MetricsTable, ProbeError> {
        let url = format!("{}{}", self.base_url, METRICS_PATH);
        tracing::debug!(%url, "querying NewRelic");

        let response = self
            .http
            .get(&url)
            .header(LICENSE_KEY_HEADER, api_key)
            .send()
            .await?;

        // NewRelic signals a rejected license key with a server-error
        // status, not a 401/403.
        if response.status().is_server_error() {
            return Err(ProbeError::InvalidApiKey);
        }

        let body = response.text().await?;
        let payload: AccountsResponse =
            serde_json::from_str(&body).map_err(|e| ProbeError::Parse {
                detail: e.to_string(),
            })?;

        Ok(reshape(payload))
    }
}

/// Flatten the nested account payload into a lookup table keyed by
/// application name, then metric display name. Later entries win on
/// duplicates: a repeated display name overwrites the earlier sample, and
/// a repeated application name replaces the earlier application's samples
/// outright.
fn reshape(payload: AccountsResponse) -> MetricsTable {
    let mut table = MetricsTable::new();
    for account in payload.accounts {
        for application in account.applications {
            let mut samples = HashMap::new();
            for threshold_value in application.threshold_values {
                samples.insert(
                    threshold_value.name,
                    MetricSample {
                        formatted_value: threshold_value.formatted_metric_value,
                        raw_value: threshold_value.metric_value.into_string(),
                    },
                );
            }
            table.insert(application.name, samples);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const SAMPLE_RESPONSE: &str = r#"{
        "accounts": [{
            "applications": [
                {
                    "name": "My App",
                    "threshold_values": [
                        {"name": "Cpu", "formatted_metric_value": "45.2 %", "metric_value": "45.2"},
                        {"name": "Response Time", "formatted_metric_value": "250 ms", "metric_value": 250}
                    ]
                },
                {
                    "name": "Other App",
                    "threshold_values": [
                        {"name": "Errors", "formatted_metric_value": "0.1 %", "metric_value": "0.1"}
                    ]
                }
            ]
        }]
    }"#;

    #[test]
    fn test_reshape_keys_by_app_then_metric() {
        let payload: AccountsResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        let table = reshape(payload);

        let sample = &table["My App"]["Cpu"];
        assert_eq!(sample.formatted_value, "45.2 %");
        assert_eq!(sample.raw_value, "45.2");
        assert!(table["Other App"].contains_key("Errors"));
    }

    #[test]
    fn test_numeric_metric_value_accepted() {
        let payload: AccountsResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        let table = reshape(payload);
        assert_eq!(table["My App"]["Response Time"].raw_value, "250");
    }

    #[test]
    fn test_duplicate_display_name_later_entry_wins() {
        let raw = r#"{
            "accounts": [{
                "applications": [{
                    "name": "My App",
                    "threshold_values": [
                        {"name": "Cpu", "formatted_metric_value": "10 %", "metric_value": "10"},
                        {"name": "Cpu", "formatted_metric_value": "20 %", "metric_value": "20"}
                    ]
                }]
            }]
        }"#;
        let payload: AccountsResponse = serde_json::from_str(raw).unwrap();
        let table = reshape(payload);
        assert_eq!(table["My App"]["Cpu"].raw_value, "20");
    }

    #[test]
    fn test_duplicate_application_replaces_earlier_samples() {
        let raw = r#"{
            "accounts": [{
                "applications": [
                    {
                        "name": "My App",
                        "threshold_values": [
                            {"name": "Cpu", "formatted_metric_value": "10 %", "metric_value": "10"}
                        ]
                    },
                    {
                        "name": "My App",
                        "threshold_values": [
                            {"name": "Errors", "formatted_metric_value": "0.5 %", "metric_value": "0.5"}
                        ]
                    }
                ]
            }]
        }"#;
        let payload: AccountsResponse = serde_json::from_str(raw).unwrap();
        let table = reshape(payload);
        // the later application wins outright, it does not merge
        assert!(table["My App"].contains_key("Errors"));
        assert!(!table["My App"].contains_key("Cpu"));
    }

    #[test]
    fn test_schema_mismatch_is_a_parse_error() {
        let err = serde_json::from_str::<AccountsResponse>(r#"{"unexpected": true}"#);
        assert!(err.is_err());
    }

    /// Serve exactly one canned HTTP response on a loopback port and return
    /// the base URL to point the client at.
    async fn serve_once(response: String) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{}", addr)
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    fn client(base_url: &str) -> NewRelicClient {
        NewRelicClient::with_base_url(Duration::from_secs(5), base_url).unwrap()
    }

    #[tokio::test]
    async fn test_server_error_status_maps_to_invalid_api_key() {
        let base_url = serve_once(http_response("500 Internal Server Error", "")).await;

        let err = client(&base_url).fetch_metrics("bad-key").await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidApiKey));
        assert_eq!(err.to_string(), "invalid NewRelic API key");
    }

    #[tokio::test]
    async fn test_well_formed_response_builds_table() {
        let base_url = serve_once(http_response("200 OK", SAMPLE_RESPONSE)).await;

        let table = client(&base_url).fetch_metrics("key").await.unwrap();
        assert_eq!(table["My App"]["Cpu"].raw_value, "45.2");
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_parse_error() {
        let base_url = serve_once(http_response("200 OK", r#"{"unexpected": true}"#)).await;

        let err = client(&base_url).fetch_metrics("key").await.unwrap_err();
        assert!(matches!(err, ProbeError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_transport_error() {
        // grab a free port, then close the listener before connecting
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = client(&base_url).fetch_metrics("key").await.unwrap_err();
        assert!(matches!(err, ProbeError::Transport { .. }));
    }
}
