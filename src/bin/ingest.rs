use anyhow::Result;
use clap::Parser;

use csvingest::config::AppConfig;
use csvingest::telemetry;
use csvingest::Pipeline;

#[derive(Parser)]
#[command(
    name = "ingest",
    about = "Fetch a CSV dataset over HTTP and bulk-load it into PostgreSQL"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<String>,

    /// Override the source CSV URL
    #[arg(long)]
    url: Option<String>,

    /// Override the target table name
    #[arg(long)]
    table: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_telemetry();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.source.url = url;
    }
    if let Some(table) = cli.table {
        config.source.table_name = table;
    }
    config.validate()?;

    tracing::info!(
        url = %config.source.url,
        table = %config.source.table_name,
        "starting ingestion"
    );

    match Pipeline::new(config).run().await {
        Ok(report) => {
            tracing::info!(
                table = %report.table_name,
                columns = report.columns,
                rows = report.load.rows_persisted,
                "ingestion complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(stage = e.stage(), error = %e, "ingestion failed");
            Err(e.into())
        }
    }
}
