mod cli;

use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands};
use reportbox::config::Config;
use reportbox::export::ReportExporter;
use reportbox::observability::{self, Metrics};
use tracing::{error, info};

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    observability::init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Server(args) => reportbox::api::run(config, args.address).await?,
        Commands::Export => export(config).await?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config, AnyError> {
    let config = match &cli.config {
        Some(path) => {
            let _ = dotenvy::dotenv();
            Config::load_from_path(path.clone())?
        }
        None => Config::load()?,
    };
    Ok(config)
}

async fn export(config: Config) -> Result<(), AnyError> {
    let exporter = ReportExporter::from_config(&config, Arc::new(Metrics::new()))?;
    let summary = exporter.export_now().await;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.has_failures() {
        error!(request_id = %summary.request_id, "Export finished with failures");
        return Err(format!("export {} had failing reports", summary.request_id).into());
    }

    info!(
        request_id = %summary.request_id,
        output = %config.output.dir.display(),
        "Export complete"
    );
    Ok(())
}
