use thiserror::Error;

//typed errors so every failure mode maps cleanly to one UNKNOWN message

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("unspecified argument for {flag}")]
    MissingArgument { flag: &'static str },

    #[error("invalid argument for --metric: {raw}")]
    InvalidMetric { raw: String },

    #[error("invalid numeric value for {field}: {raw}")]
    InvalidNumber { field: String, raw: String },

    #[error("invalid NewRelic API key")]
    InvalidApiKey,

    #[error("metrics request failed: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    #[error("unexpected response from NewRelic: {detail}")]
    Parse { detail: String },

    #[error("invalid application name for --app: {name}")]
    UnknownApplication { name: String },

    #[error("no {metric} metric reported for application {application}")]
    MissingMetric { application: String, metric: String },
}
