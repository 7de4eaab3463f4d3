use std::process::ExitCode;

use bootcamp_api::{config::Config, observability::init_tracing, Application};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let result = match Application::build(config).await {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Service terminated");
            ExitCode::FAILURE
        }
    }
}
