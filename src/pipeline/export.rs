//! Flat tabular export of normalized records.

use std::borrow::Borrow;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config;
use crate::models::Record;

pub const EXPORT_HEADER: [&str; 3] = ["Test Name", "Result", "Status"];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write one header row and one row per record. Returns the row count.
pub fn write_records<W, I, R>(writer: W, records: I) -> Result<usize, ExportError>
where
    W: Write,
    I: IntoIterator<Item = R>,
    R: Borrow<Record>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EXPORT_HEADER)?;

    let mut rows = 0;
    for record in records {
        let record = record.borrow();
        csv_writer.write_record([
            record.test_name.as_str(),
            record.value.to_string().as_str(),
            record.status.as_str(),
        ])?;
        rows += 1;
    }

    csv_writer.flush()?;
    Ok(rows)
}

/// Write records to `path`, creating parent directories as needed.
pub fn export_to_file<I, R>(path: &Path, records: I) -> Result<usize, ExportError>
where
    I: IntoIterator<Item = R>,
    R: Borrow<Record>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let rows = write_records(file, records)?;
    tracing::info!(path = %path.display(), rows, "Records exported");
    Ok(rows)
}

/// `<exports dir>/<patient>_records.csv`, with the id reduced to safe characters.
pub fn default_export_path(patient_id: &str) -> PathBuf {
    let safe: String = patient_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    config::exports_dir().join(format!("{safe}_records.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordStatus;

    #[test]
    fn header_and_rows_in_order() {
        let records = vec![
            Record::new("EGFR", 5.0, RecordStatus::Final),
            Record::new("KRAS", "pending", RecordStatus::Preliminary),
            Record::new("", "", RecordStatus::Unknown),
        ];
        let mut out = Vec::new();
        let rows = write_records(&mut out, &records).unwrap();
        assert_eq!(rows, 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Test Name,Result,Status\nEGFR,5,final\nKRAS,pending,preliminary\n,,unknown\n"
        );
    }

    #[test]
    fn delimiters_in_values_are_quoted() {
        let records = vec![Record::new("Panel, extended", "a \"b\"", RecordStatus::Final)];
        let mut out = Vec::new();
        write_records(&mut out, &records).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("\"Panel, extended\",\"a \"\"b\"\"\",final\n"));
    }

    #[test]
    fn empty_sequence_writes_header_only() {
        let mut out = Vec::new();
        assert_eq!(write_records(&mut out, Vec::<Record>::new()).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "Test Name,Result,Status\n");
    }

    #[test]
    fn export_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("p1_records.csv");
        let records = vec![Record::new("TP53", 1.0, RecordStatus::Final)];
        let rows = export_to_file(&path, records).unwrap();
        assert_eq!(rows, 1);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), EXPORT_HEADER);
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(first.iter().collect::<Vec<_>>(), vec!["TP53", "1", "final"]);
    }

    #[test]
    fn default_path_sanitizes_patient_id() {
        let path = default_export_path("../evil id");
        assert_eq!(path.file_name().unwrap(), "___evil_id_records.csv");
        assert!(path.starts_with(config::exports_dir()));
    }
}
