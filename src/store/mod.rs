//! PostgreSQL access: connection, table provisioning, and bulk loading.

mod error;
mod load;
mod provision;

pub use error::{LoadError, SchemaError};
pub use load::{BulkLoader, LoadReport, LoadStrategy, DEFAULT_BATCH_SIZE};
pub use provision::provision_table;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;

/// Quote an identifier for safe interpolation into generated SQL by
/// doubling any embedded double quote.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Open a connection pool against the configured database.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.connection_string())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_wraps_plain_names() {
        assert_eq!(quote_ident("year"), "\"year\"");
    }

    #[test]
    fn quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
