/// A parsed CSV payload: ordered column names and positionally aligned rows.
///
/// Produced once per run by the fetcher and immutable afterwards. The parser
/// guarantees that every row has exactly as many fields as there are columns;
/// an empty string denotes a missing value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularDataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TabularDataset {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Iterate over the values of a single column, in row order.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[idx].as_str())
    }
}
