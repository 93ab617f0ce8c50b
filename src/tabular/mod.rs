//! CSV reading: raw bytes to ordered records
//!
//! Records are produced lazily; the ingestion pipeline decides when to drain.

use std::io::Read;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::Fields;

/// One parsed row: column name → string value, in column order
pub type Record = Fields;

/// CSV dialect used to read uploads
#[derive(Debug, Clone, Copy)]
pub struct TabularParser {
    pub delimiter: u8,
    pub has_headers: bool,
}

impl Default for TabularParser {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

impl TabularParser {
    pub fn new(delimiter: u8, has_headers: bool) -> Self {
        Self {
            delimiter,
            has_headers,
        }
    }

    /// Start reading `input`. The header row (if any) is read eagerly.
    pub fn records<R: Read>(&self, input: R) -> Result<Records<R>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .from_reader(input);

        let headers = if self.has_headers {
            let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
            Some(headers)
        } else {
            None
        };

        Ok(Records {
            headers,
            rows: reader.into_records(),
        })
    }

    /// Check that `bytes` holds at least one well-formed record.
    pub fn validate(&self, bytes: &[u8]) -> Result<()> {
        let mut records = self.records(bytes)?;
        match records.next() {
            Some(Ok(_)) => Ok(()),
            Some(Err(err)) => Err(err),
            None => Err(Error::Validation("CSV file is empty".to_string())),
        }
    }
}

/// Lazy iterator over the rows of one input
pub struct Records<R: Read> {
    headers: Option<Vec<String>>,
    rows: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> Records<R> {
    fn to_record(&self, row: &csv::StringRecord) -> Record {
        let mut record = Record::new();
        match &self.headers {
            Some(headers) => {
                for (name, value) in headers.iter().zip(row.iter()) {
                    record.insert(name.clone(), Value::String(value.to_string()));
                }
            }
            None => {
                for (i, value) in row.iter().enumerate() {
                    record.insert(format!("column_{}", i + 1), Value::String(value.to_string()));
                }
            }
        }
        record
    }
}

impl<R: Read> Iterator for Records<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(err) => return Some(Err(err.into())),
        };
        Some(Ok(self.to_record(&row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<Record> {
        TabularParser::default()
            .records(input.as_bytes())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn keeps_column_order() {
        let records = parse("zeta,alpha\n1,2\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(records[0]["alpha"], "2");
    }

    #[test]
    fn skips_empty_lines() {
        let records = parse("name,city\nHerzl,Tel Aviv\n\n\nJaffa,Tel Aviv\n");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn quoted_fields_keep_delimiters() {
        let records = parse("name,city\n\"Allenby, corner\",\"Tel Aviv\"\n");
        assert_eq!(records[0]["name"], "Allenby, corner");
    }

    #[test]
    fn headerless_input_gets_positional_names() {
        let parser = TabularParser::new(b';', false);
        let records: Vec<Record> = parser
            .records("Herzl;Tel Aviv\n".as_bytes())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records[0]["column_1"], "Herzl");
        assert_eq!(records[0]["column_2"], "Tel Aviv");
    }

    #[test]
    fn ragged_rows_are_parse_errors() {
        let result: Result<Vec<Record>> = TabularParser::default()
            .records("a,b\n1,2,3\n".as_bytes())
            .unwrap()
            .collect();
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().starts_with("Invalid CSV format: "));
    }

    #[test]
    fn validate_reports_empty_input() {
        let parser = TabularParser::default();
        assert_eq!(
            parser.validate(b"").unwrap_err().to_string(),
            "CSV file is empty"
        );
        assert_eq!(
            parser.validate(b"name,city\n").unwrap_err().to_string(),
            "CSV file is empty"
        );
        assert!(parser.validate(b"name,city\nHerzl,Haifa\n").is_ok());
    }
}
