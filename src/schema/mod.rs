//! Schema inference: column name sanitization and value type classification.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::dataset::TabularDataset;

/// Semantic type inferred for a column.
///
/// Inference is all-or-nothing per column: a value that does not fit the
/// current best guess widens the column along the order
/// integer < decimal < boolean < text. Text accepts everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Decimal,
    Boolean,
    Timestamp,
    Text,
}

impl ColumnType {
    /// Narrowest type that classifies a single non-empty value.
    ///
    /// Checked in order: integer, decimal, boolean token, timestamp, text.
    /// Note that `1`/`0` classify as integer, not boolean, because integer
    /// comes first in the order.
    pub fn classify(raw: &str) -> Self {
        let value = raw.trim();
        if value.parse::<i64>().is_ok() {
            ColumnType::Integer
        } else if value.parse::<f64>().is_ok() {
            ColumnType::Decimal
        } else if parse_boolean(value).is_some() {
            ColumnType::Boolean
        } else if parse_timestamp(value).is_some() {
            ColumnType::Timestamp
        } else {
            ColumnType::Text
        }
    }

    /// Join two inferred types on the widening lattice.
    ///
    /// Equal types join to themselves, integer and decimal join to decimal,
    /// and every other mixed pair falls back to text.
    pub fn widen(self, other: Self) -> Self {
        use ColumnType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Decimal) | (Decimal, Integer) => Decimal,
            _ => Text,
        }
    }

    /// PostgreSQL column type used when provisioning the table.
    pub fn pg_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "BIGINT",
            ColumnType::Decimal => "DOUBLE PRECISION",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Parse one of the fixed boolean tokens, ASCII case-insensitive.
pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Parse a value under the recognized date/time formats.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Infer the type of one column by folding `classify` over its non-empty
/// values with `widen`. Empty values never influence the result; a column
/// with no non-empty values at all is text.
pub fn infer_column<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ColumnType::classify)
        .reduce(ColumnType::widen)
        .unwrap_or(ColumnType::Text)
}

/// Sanitize a source column name into a safe lower-case identifier:
/// trim, lower-case, and map every character outside `[a-z0-9_]` to `_`.
/// A name with no usable characters falls back to `column`.
pub fn sanitize_identifier(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '_') {
        "column".to_string()
    } else {
        sanitized
    }
}

/// Make sanitized names unique in header order: the first occurrence keeps
/// the bare name, later collisions get `_2`, `_3`, ... suffixes. Suffixed
/// candidates are re-checked so the result never collides.
fn dedupe_identifiers(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        if seen.insert(name.clone()) {
            out.push(name);
            continue;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{name}_{n}");
            if seen.insert(candidate.clone()) {
                out.push(candidate);
                break;
            }
            n += 1;
        }
    }

    out
}

/// One inferred column of the target table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

/// Target table schema derived from a dataset.
///
/// Holds only the inferred data columns; the surrogate identity key and the
/// import timestamp are appended by the provisioner and never appear here.
/// The same definition must be threaded through provisioning and loading so
/// both agree on column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableDefinition {
    /// Derive the table definition for a dataset: sanitized unique column
    /// names paired with the inferred type of each column. Every column is
    /// nullable; inference never rejects a row for missing data.
    pub fn infer(table_name: &str, dataset: &TabularDataset) -> Self {
        let names = dedupe_identifiers(
            dataset
                .columns()
                .iter()
                .map(|c| sanitize_identifier(c))
                .collect(),
        );

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| ColumnSchema {
                name,
                column_type: infer_column(dataset.column_values(idx)),
                nullable: true,
            })
            .collect();

        Self {
            table_name: table_name.to_string(),
            columns,
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::parse_csv;

    #[test]
    fn integers_stay_integer() {
        assert_eq!(infer_column(["3", "4", "5"]), ColumnType::Integer);
    }

    #[test]
    fn decimal_value_widens_integer_column() {
        assert_eq!(infer_column(["3", "4", "5", "4.5"]), ColumnType::Decimal);
    }

    #[test]
    fn unparseable_value_widens_to_text() {
        assert_eq!(
            infer_column(["3", "4", "5", "4.5", "abc"]),
            ColumnType::Text
        );
    }

    #[test]
    fn boolean_tokens_infer_boolean() {
        assert_eq!(infer_column(["true", "false", "TRUE"]), ColumnType::Boolean);
    }

    #[test]
    fn zero_one_column_infers_integer() {
        // integer comes before boolean in the classification order
        assert_eq!(infer_column(["1", "0", "1"]), ColumnType::Integer);
    }

    #[test]
    fn dates_infer_timestamp() {
        assert_eq!(
            infer_column(["2020-01-01", "2021-06-30", "1999-12-31 23:59:59"]),
            ColumnType::Timestamp
        );
    }

    #[test]
    fn empty_values_do_not_influence_inference() {
        assert_eq!(infer_column(["", "42", "", ""]), ColumnType::Integer);
    }

    #[test]
    fn all_empty_column_is_text() {
        assert_eq!(infer_column(["", "", ""]), ColumnType::Text);
    }

    #[test]
    fn widen_is_symmetric_on_numeric_pair() {
        assert_eq!(
            ColumnType::Integer.widen(ColumnType::Decimal),
            ColumnType::Decimal
        );
        assert_eq!(
            ColumnType::Decimal.widen(ColumnType::Integer),
            ColumnType::Decimal
        );
    }

    #[test]
    fn widen_mixed_pairs_fall_back_to_text() {
        assert_eq!(
            ColumnType::Timestamp.widen(ColumnType::Integer),
            ColumnType::Text
        );
        assert_eq!(
            ColumnType::Boolean.widen(ColumnType::Decimal),
            ColumnType::Text
        );
    }

    #[test]
    fn sanitize_owid_header() {
        assert_eq!(
            sanitize_identifier("Crude Birth Rate (per 1,000 people)"),
            "crude_birth_rate__per_1_000_people_"
        );
    }

    #[test]
    fn sanitize_trims_and_lowercases() {
        assert_eq!(sanitize_identifier("  Entity Name "), "entity_name");
    }

    #[test]
    fn sanitize_empty_name_falls_back() {
        assert_eq!(sanitize_identifier("  "), "column");
        assert_eq!(sanitize_identifier("()"), "column");
    }

    #[test]
    fn colliding_names_get_numeric_suffixes() {
        let names = dedupe_identifiers(vec![
            "rate".to_string(),
            "rate".to_string(),
            "rate".to_string(),
        ]);
        assert_eq!(names, ["rate", "rate_2", "rate_3"]);
    }

    #[test]
    fn suffixed_candidate_skips_existing_name() {
        // "rate_2" is already taken by a real column, so the second "rate"
        // must move on to "rate_3"
        let names = dedupe_identifiers(vec![
            "rate".to_string(),
            "rate_2".to_string(),
            "rate".to_string(),
        ]);
        assert_eq!(names, ["rate", "rate_2", "rate_3"]);
    }

    #[test]
    fn infer_table_definition_end_to_end() {
        let body = "entity,code,year,rate\nWorld,OWID_WRL,2000,21.5\nWorld,OWID_WRL,2001,21.0\n";
        let dataset = parse_csv(body).unwrap();
        let table = TableDefinition::infer("crude_birth_rate", &dataset);

        assert_eq!(table.table_name, "crude_birth_rate");
        let types: Vec<_> = table
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.column_type))
            .collect();
        assert_eq!(
            types,
            [
                ("entity", ColumnType::Text),
                ("code", ColumnType::Text),
                ("year", ColumnType::Integer),
                ("rate", ColumnType::Decimal),
            ]
        );
        assert!(table.columns.iter().all(|c| c.nullable));
    }

    #[test]
    fn colliding_headers_infer_distinct_columns() {
        // "Rate" and "rate " both sanitize to "rate"
        let body = "Rate,rate \n1,a\n2,b\n";
        let dataset = parse_csv(body).unwrap();
        let table = TableDefinition::infer("t", &dataset);

        assert_eq!(table.columns[0].name, "rate");
        assert_eq!(table.columns[1].name, "rate_2");
        assert_eq!(table.columns[0].column_type, ColumnType::Integer);
        assert_eq!(table.columns[1].column_type, ColumnType::Text);
    }
}
