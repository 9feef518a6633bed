use clap::Parser;
use dotenv::dotenv;
use std::process::ExitCode;
use taskbell::cli::{self, AppContext, Cli};
use taskbell::config::Config;
use taskbell::logging;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    let otel_exporters = match logging::exporters_from_env() {
        Ok(exporters) => exporters,
        Err(otel_err) => {
            eprintln!("Failed to set up telemetry: {otel_err:#}");
            return ExitCode::FAILURE;
        }
    };
    let logging_result = logging::init_env_filter()
        .and_then(|env_filter| logging::setup_logging_and_tracing(env_filter, otel_exporters.as_ref()));
    if let Err(logging_err) = logging_result {
        eprintln!("Failed to set up logging: {logging_err:#}");
        return ExitCode::FAILURE;
    }

    let app = match Config::load().and_then(AppContext::new) {
        Ok(app) => app,
        Err(config_err) => {
            eprintln!("Configuration problem: {config_err:#}");
            return ExitCode::FAILURE;
        }
    };

    match cli::run(cli.command, &app).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(cmd_err) => {
            eprintln!("{cmd_err}");
            ExitCode::FAILURE
        }
    }
}
