//! HTTP retrieval and CSV parsing of the source dataset.

mod error;

pub use error::{FetchError, ParseError};

use std::time::Duration;

use crate::dataset::TabularDataset;

/// Default network timeout for the CSV download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads a CSV payload over HTTP and parses it into a [`TabularDataset`].
///
/// The first record of the payload is always the header row. No retry is
/// performed here; a failed fetch surfaces immediately to the caller.
#[derive(Debug, Clone)]
pub struct CsvFetcher {
    client: reqwest::Client,
}

impl CsvFetcher {
    /// Create a fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Issue a GET against `url` and parse the body as CSV.
    ///
    /// Fails with [`FetchError::Status`] on non-2xx responses and with
    /// [`FetchError::Request`] on timeout or connection failure. A body that
    /// is not consistent delimited text fails with [`FetchError::Parse`].
    pub async fn fetch(&self, url: &str) -> Result<TabularDataset, FetchError> {
        tracing::info!(url, "downloading CSV");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await?;
        tracing::debug!(bytes = body.len(), "response body received");

        let dataset = parse_csv(&body)?;
        tracing::info!(
            rows = dataset.n_rows(),
            columns = dataset.n_cols(),
            "CSV downloaded and parsed"
        );

        Ok(dataset)
    }
}

/// Parse delimited text into a [`TabularDataset`].
///
/// The first record defines the column names; every subsequent record must
/// carry exactly as many fields as the header or the whole parse fails.
pub fn parse_csv(body: &str) -> Result<TabularDataset, ParseError> {
    // flexible(true) defers ragged-row detection to our own check below,
    // which reports the offending row number and both field counts.
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::MissingHeader);
    }

    let columns: Vec<String> = headers.iter().map(str::to_string).collect();
    let mut rows = Vec::new();

    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != columns.len() {
            return Err(ParseError::FieldCount {
                // 1-based line number, counting the header
                row: i + 2,
                expected: columns.len(),
                actual: record.len(),
            });
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(TabularDataset::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_preserves_shape() {
        let body = "entity,code,year\nWorld,OWID_WRL,2000\nWorld,OWID_WRL,2001\n";
        let dataset = parse_csv(body).unwrap();

        assert_eq!(dataset.columns(), ["entity", "code", "year"]);
        assert_eq!(dataset.n_rows(), 2);
        assert!(dataset.rows().iter().all(|r| r.len() == 3));
        assert_eq!(dataset.rows()[1], ["World", "OWID_WRL", "2001"]);
    }

    #[test]
    fn parse_header_only_yields_zero_rows() {
        let dataset = parse_csv("a,b,c\n").unwrap();
        assert_eq!(dataset.n_cols(), 3);
        assert_eq!(dataset.n_rows(), 0);
    }

    #[test]
    fn parse_rejects_ragged_row() {
        let body = "a,b,c\n1,2,3\n4,5\n";
        let err = parse_csv(body).unwrap_err();

        match err {
            ParseError::FieldCount {
                row,
                expected,
                actual,
            } => {
                assert_eq!(row, 3);
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected FieldCount, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_empty_body() {
        assert!(matches!(parse_csv(""), Err(ParseError::MissingHeader)));
    }

    #[test]
    fn parse_keeps_empty_fields() {
        let body = "a,b\n1,\n,2\n";
        let dataset = parse_csv(body).unwrap();
        assert_eq!(dataset.rows()[0], ["1", ""]);
        assert_eq!(dataset.rows()[1], ["", "2"]);
    }

    #[test]
    fn parse_handles_quoted_commas() {
        let body = "name,note\nWorld,\"a, quoted, field\"\n";
        let dataset = parse_csv(body).unwrap();
        assert_eq!(dataset.rows()[0][1], "a, quoted, field");
    }
}
