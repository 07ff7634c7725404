use check_newrelic::config::Config;
use check_newrelic::metrics::newrelic::NewRelicClient;
use check_newrelic::probe;
use check_newrelic::status::StatusReport;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Config::parse();
    init_tracing(config.debug);
    tracing::debug!(?config, "parsed command line");

    let report = match NewRelicClient::new(config.timeout()) {
        Ok(client) => probe::run(&config, &client).await,
        Err(err) => StatusReport::unknown(err.to_string()),
    };

    // The supervisor contract: one line on stdout, then the status code.
    println!("{report}");
    std::process::exit(report.status.exit_code());
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "check_newrelic=debug"
    } else {
        "check_newrelic=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
