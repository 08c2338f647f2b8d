//! CSV parsing into an in-memory table.

use crate::error::{HjelperError, Result};
use serde::Serialize;

/// A parsed CSV file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvTable {
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Data rows as read; ragged rows are kept as-is.
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parse CSV bytes. The first record is the header.
    ///
    /// Row lengths are not checked against the header; pandas pads short
    /// rows and treats extra leading fields as an index. Fails on input that
    /// is not UTF-8 and on input with no header at all.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(HjelperError::Csv("file has no header row".to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Short shape description, e.g. `3 rows x 2 columns (name, value)`.
    pub fn describe(&self) -> String {
        format!(
            "{} rows x {} columns ({})",
            self.row_count(),
            self.column_count(),
            self.headers.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let table = CsvTable::parse(b"region,usage\nseoul,120\nbusan,80\n").unwrap();
        assert_eq!(table.headers, vec!["region", "usage"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1], vec!["busan", "80"]);
        assert_eq!(table.describe(), "2 rows x 2 columns (region, usage)");
    }

    #[test]
    fn test_quoted_fields_and_unicode() {
        let table = CsvTable::parse("지역,메모\n서울,\"a, b\"\n".as_bytes()).unwrap();
        assert_eq!(table.headers[0], "지역");
        assert_eq!(table.rows[0][1], "a, b");
    }

    #[test]
    fn test_ragged_rows_accepted() {
        let table = CsvTable::parse(b"region,usage,note\nseoul,120\nbusan,80,ok\n").unwrap();
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0], vec!["seoul", "120"]);
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = CsvTable::parse(b"a,b\n1,\xff\xfe\n").unwrap_err();
        assert!(matches!(err, HjelperError::Csv(_)));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(CsvTable::parse(b"").is_err());
    }
}
