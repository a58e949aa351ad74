mod cli;

use clap::Parser;
use dbpeek_adapters::mysql::MysqlConnectionBackend;
use dbpeek_core::error::InspectError;
use dbpeek_core::navigator::{browse, ErrorView, View};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::Cli;

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let subscriber = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

fn into_view(outcome: Result<View, InspectError>) -> Result<View, InspectError> {
    match outcome {
        Ok(view) => Ok(view),
        Err(error) if error.is_fatal() => Err(error),
        Err(error) => Ok(View::Error(ErrorView::from(&error))),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = cli.load_config()?;
    let outcome = browse(
        &MysqlConnectionBackend,
        &config.profile,
        config.browse,
        &cli.request(),
    )
    .await;

    let view = into_view(outcome).inspect_err(|error| {
        error!(error = %error, "navigation aborted");
    })?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
