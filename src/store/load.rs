use sqlx::postgres::PgPoolCopyExt;
use sqlx::query_builder::Separated;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{quote_ident, LoadError};
use crate::schema::{parse_boolean, parse_timestamp, ColumnType, TableDefinition};

/// Default rows per INSERT statement for the batched strategy.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// How rows are transferred into the provisioned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Serialize all rows to a CSV stream and drive `COPY ... FROM STDIN`
    /// in one pass. Fastest path; a failure persists nothing.
    Copy,
    /// Insert rows in fixed-size batches, one statement per batch, each
    /// committed on its own, so a mid-run failure leaves prior batches
    /// durable.
    Batched { batch_size: usize },
}

/// Outcome of a completed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_attempted: usize,
    pub rows_persisted: usize,
}

/// Writes dataset rows into the provisioned table.
///
/// Column order is taken from the [`TableDefinition`] used at provisioning
/// time; provisioning and loading must share the same definition or the
/// load would corrupt data silently.
#[derive(Debug, Clone, Copy)]
pub struct BulkLoader {
    strategy: LoadStrategy,
}

impl BulkLoader {
    pub fn new(strategy: LoadStrategy) -> Self {
        Self { strategy }
    }

    /// Persist every row into the table, honoring the definition's column
    /// order. Ragged rows cannot occur here; the parser rejected them.
    pub async fn load(
        &self,
        pool: &PgPool,
        table: &TableDefinition,
        rows: &[Vec<String>],
    ) -> Result<LoadReport, LoadError> {
        let report = match self.strategy {
            LoadStrategy::Copy => self.load_copy(pool, table, rows).await?,
            LoadStrategy::Batched { batch_size } => {
                self.load_batched(pool, table, rows, batch_size).await?
            }
        };

        tracing::info!(
            table = %table.table_name,
            rows = report.rows_persisted,
            "bulk load complete"
        );

        Ok(report)
    }

    async fn load_copy(
        &self,
        pool: &PgPool,
        table: &TableDefinition,
        rows: &[Vec<String>],
    ) -> Result<LoadReport, LoadError> {
        let store_err = |source| LoadError::Store {
            rows_attempted: rows.len(),
            rows_persisted: 0,
            source,
        };

        // Fields are normalized per column type so both strategies persist
        // the same values: typed fields are trimmed (a whitespace-only field
        // is a missing value, matching inference), text fields go verbatim.
        // Empty fields become NULL; FORCE_NULL below covers the case where
        // the csv writer quotes a lone empty field.
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in rows {
            let record = table
                .columns
                .iter()
                .zip(row)
                .map(|(column, field)| copy_field(column.column_type, field));
            writer.write_record(record)?;
        }
        let data = match writer.into_inner() {
            Ok(data) => data,
            Err(e) => {
                return Err(LoadError::Serialize(csv::Error::from(
                    std::io::Error::other(e.to_string()),
                )))
            }
        };

        let column_list = table
            .column_names()
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(", ");
        let statement = format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv, FORCE_NULL ({}))",
            quote_ident(&table.table_name),
            column_list,
            column_list
        );

        let mut copy = pool.copy_in_raw(&statement).await.map_err(store_err)?;
        copy.send(data.as_slice()).await.map_err(store_err)?;
        let copied = copy.finish().await.map_err(store_err)?;

        Ok(LoadReport {
            rows_attempted: rows.len(),
            rows_persisted: copied as usize,
        })
    }

    async fn load_batched(
        &self,
        pool: &PgPool,
        table: &TableDefinition,
        rows: &[Vec<String>],
        batch_size: usize,
    ) -> Result<LoadReport, LoadError> {
        let column_list = table
            .column_names()
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(", ");
        let insert_prefix = format!(
            "INSERT INTO {} ({}) ",
            quote_ident(&table.table_name),
            column_list
        );

        let mut persisted = 0usize;
        for (batch_idx, chunk) in rows.chunks(batch_size.max(1)).enumerate() {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(insert_prefix.as_str());
            builder.push_values(chunk, |mut b, row| {
                for (column, field) in table.columns.iter().zip(row) {
                    push_bind_field(&mut b, column.column_type, field);
                }
            });

            // One statement per batch, committed on its own; an error here
            // leaves every prior batch durable.
            builder
                .build()
                .execute(pool)
                .await
                .map_err(|source| LoadError::Store {
                    rows_attempted: rows.len(),
                    rows_persisted: persisted,
                    source,
                })?;

            persisted += chunk.len();
            tracing::info!(batch = batch_idx + 1, rows = chunk.len(), "batch inserted");
        }

        Ok(LoadReport {
            rows_attempted: rows.len(),
            rows_persisted: persisted,
        })
    }
}

/// Normalize one field for the COPY stream.
///
/// Typed fields are trimmed, and a whitespace-only field collapses to the
/// empty string (NULL under COPY), mirroring how inference treats it. Text
/// fields pass through verbatim; only the truly empty field is NULL.
fn copy_field(column_type: ColumnType, raw: &str) -> &str {
    match column_type {
        ColumnType::Text => raw,
        _ => raw.trim(),
    }
}

/// Bind one field as a typed value matching its inferred column type.
/// Missing fields bind as NULL of the column's type.
fn push_bind_field<'qb, 'args>(
    b: &mut Separated<'qb, 'args, Postgres, &'static str>,
    column_type: ColumnType,
    raw: &str,
) {
    // Text is stored verbatim; trimming here would mutate data the fetcher
    // never touched. Only the truly empty field is a missing value.
    if column_type == ColumnType::Text {
        if raw.is_empty() {
            b.push_bind(None::<String>);
        } else {
            b.push_bind(Some(raw.to_string()));
        }
        return;
    }

    let value = raw.trim();
    if value.is_empty() {
        match column_type {
            ColumnType::Integer => b.push_bind(None::<i64>),
            ColumnType::Decimal => b.push_bind(None::<f64>),
            ColumnType::Boolean => b.push_bind(None::<bool>),
            _ => b.push_bind(None::<chrono::NaiveDateTime>),
        };
        return;
    }

    match column_type {
        ColumnType::Integer => b.push_bind(value.parse::<i64>().ok()),
        ColumnType::Decimal => b.push_bind(value.parse::<f64>().ok()),
        ColumnType::Boolean => b.push_bind(parse_boolean(value)),
        _ => b.push_bind(parse_timestamp(value)),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_field_trims_typed_columns() {
        assert_eq!(copy_field(ColumnType::Integer, " 42 "), "42");
        assert_eq!(copy_field(ColumnType::Decimal, "4.5\t"), "4.5");
    }

    #[test]
    fn copy_field_collapses_whitespace_only_typed_field() {
        // ["1", " "] infers integer; the blank must reach COPY as NULL
        assert_eq!(copy_field(ColumnType::Integer, " "), "");
        assert_eq!(copy_field(ColumnType::Timestamp, "  "), "");
    }

    #[test]
    fn copy_field_keeps_text_verbatim() {
        assert_eq!(copy_field(ColumnType::Text, "  Ivory Coast "), "  Ivory Coast ");
        assert_eq!(copy_field(ColumnType::Text, " "), " ");
    }

    #[test]
    fn lone_empty_field_serializes_quoted() {
        // The csv writer quotes a lone empty field to keep the record
        // non-empty; the COPY statement's FORCE_NULL maps it back to NULL.
        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in [vec!["1".to_string()], vec![String::new()]] {
            writer.write_record(&row).unwrap();
        }
        let data = writer.into_inner().unwrap();
        assert_eq!(data, b"1\n\"\"\n");
    }
}
