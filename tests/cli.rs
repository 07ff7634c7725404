use assert_cmd::Command;

fn probe() -> Command {
    let mut cmd = Command::cargo_bin("check-newrelic").unwrap();
    // keep host environment from satisfying required flags
    cmd.env_remove("NEWRELIC_APP_NAME");
    cmd.env_remove("NEWRELIC_API_KEY");
    cmd
}

#[test]
fn no_arguments_reports_unknown_on_stdout() {
    probe()
        .assert()
        .code(3)
        .stdout("UNKNOWN: unspecified argument for --app\n");
}

#[test]
fn missing_api_key_reports_unknown() {
    probe()
        .args(["-a", "My App", "-m", "cpu"])
        .assert()
        .code(3)
        .stdout("UNKNOWN: unspecified argument for --api-key\n");
}

#[test]
fn invalid_metric_selector_reports_unknown() {
    probe()
        .args(["-a", "My App", "-m", "bogus", "-k", "key"])
        .assert()
        .code(3)
        .stdout("UNKNOWN: invalid argument for --metric: bogus\n");
}

#[test]
fn empty_metric_selector_counts_as_missing() {
    probe()
        .args(["-a", "My App", "-m", "", "-k", "key"])
        .assert()
        .code(3)
        .stdout("UNKNOWN: unspecified argument for --metric\n");
}

#[test]
fn help_prints_usage() {
    probe().arg("--help").assert().success();
}
