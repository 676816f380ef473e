use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    if std::env::var("BRAWL_LOG_JSON").is_ok_and(|v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: brawl-sim <scenario.toml>");
        return ExitCode::from(2);
    };

    tracing::info!(path = %path, "Brawl simulation starting");
    let report = match brawl_sim::load_scenario(&path).and_then(|s| brawl_sim::run_scenario(&s)) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Simulation failed");
            return ExitCode::FAILURE;
        },
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!(error = %e, "Report serialization failed");
            ExitCode::FAILURE
        },
    }
}
