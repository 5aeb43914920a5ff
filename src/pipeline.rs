//! Sequences fetch → infer → provision → load against a single store
//! connection pool.

use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;

use crate::config::AppConfig;
use crate::fetch::{CsvFetcher, FetchError};
use crate::schema::TableDefinition;
use crate::store::{self, BulkLoader, LoadError, LoadReport, SchemaError};

/// Failure of a pipeline run, tagged with the originating stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("database connection failed: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("table provisioning failed: {0}")]
    Schema(#[from] SchemaError),

    #[error("bulk load failed: {0}")]
    Load(#[from] LoadError),
}

impl PipelineError {
    /// Name of the stage the failure originated in, for log lines.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Connect(_) => "connect",
            PipelineError::Fetch(FetchError::Parse(_)) => "parse",
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Schema(_) => "provision",
            PipelineError::Load(_) => "load",
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub table_name: String,
    pub columns: usize,
    pub load: LoadReport,
}

/// The full ingestion pipeline for one CSV source.
pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion.
    ///
    /// The connection pool is acquired once up front and closed exactly once
    /// on every exit path. Any stage failure aborts the remaining stages.
    /// Runs are single-threaded per invocation; callers must serialize
    /// concurrent invocations against the same table.
    pub async fn run(&self) -> Result<PipelineReport, PipelineError> {
        let pool = store::connect(&self.config.database).await?;
        tracing::info!(host = %self.config.database.host, "connected to PostgreSQL");

        let result = self.run_stages(&pool).await;
        pool.close().await;

        result
    }

    async fn run_stages(&self, pool: &PgPool) -> Result<PipelineReport, PipelineError> {
        let fetcher = CsvFetcher::new(Duration::from_secs(self.config.source.http_timeout_secs))?;
        let dataset = fetcher.fetch(&self.config.source.url).await?;

        // Derived once; the same column order drives both the CREATE TABLE
        // statement and the row binds below.
        let table = TableDefinition::infer(&self.config.source.table_name, &dataset);
        tracing::debug!(
            columns = ?table.column_names().collect::<Vec<_>>(),
            "schema inferred"
        );

        store::provision_table(pool, &table).await?;

        let loader = BulkLoader::new(self.config.load.strategy());
        let load = loader.load(pool, &table, dataset.rows()).await?;

        Ok(PipelineReport {
            table_name: table.table_name.clone(),
            columns: table.columns.len(),
            load,
        })
    }
}
