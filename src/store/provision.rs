use sqlx::PgPool;

use super::{quote_ident, SchemaError};
use crate::schema::TableDefinition;

/// Create the target table if it does not already exist.
///
/// Declares every inferred column in definition order between a surrogate
/// `id BIGSERIAL PRIMARY KEY` and an `imported_at` timestamp defaulting to
/// the moment of insertion. Idempotent: re-running against an existing
/// table neither errors nor mutates it.
pub async fn provision_table(pool: &PgPool, table: &TableDefinition) -> Result<(), SchemaError> {
    let mut column_defs = Vec::with_capacity(table.columns.len() + 2);
    column_defs.push("id BIGSERIAL PRIMARY KEY".to_string());
    for column in &table.columns {
        let constraint = if column.nullable { "" } else { " NOT NULL" };
        column_defs.push(format!(
            "{} {}{}",
            quote_ident(&column.name),
            column.column_type.pg_type(),
            constraint
        ));
    }
    column_defs.push("imported_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string());

    let statement = format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(&table.table_name),
        column_defs.join(", ")
    );

    sqlx::query(&statement).execute(pool).await?;

    tracing::info!(
        table = %table.table_name,
        columns = table.columns.len(),
        "table created or verified"
    );

    Ok(())
}
