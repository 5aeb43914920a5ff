//! Error types for CSV fetching and parsing

use thiserror::Error;

/// Errors that can occur while retrieving the CSV payload over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request could not be sent or timed out
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("HTTP status {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Body was retrieved but is not valid CSV
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors that can occur while parsing the response body as CSV.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Body is not valid delimited text
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Body is empty or has no header row
    #[error("response body has no header row")]
    MissingHeader,

    /// A data row disagrees with the header on field count
    #[error("row {row} has {actual} fields, header has {expected}")]
    FieldCount {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
