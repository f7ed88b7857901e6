// glrestore/src/restore/report.rs
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::classify::{ClassificationTable, ObjectRecord};
use crate::errors::{AppError, Result};

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    file: String,
    storage_class: &'a str,
    restore_status: &'static str,
    size_bytes: Option<u64>,
    #[serde(rename = "LastModified")]
    last_modified: Option<String>,
}

impl<'a> From<&'a ObjectRecord> for ReportRow<'a> {
    fn from(record: &'a ObjectRecord) -> Self {
        ReportRow {
            file: record.location.to_string(),
            storage_class: record.storage_class.as_str(),
            restore_status: record.status().as_str(),
            size_bytes: record.size_bytes,
            last_modified: record.last_modified.map(|t| t.to_rfc3339()),
        }
    }
}

/// Writes one CSV row per record, header first, in table order.
pub fn write_report<W: Write>(writer: W, table: &ClassificationTable) -> Result<()> {
    // Header written by hand so an empty table still gets one.
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(["file", "storage_class", "restore_status", "size_bytes", "LastModified"])?;
    for record in table.records() {
        wtr.serialize(ReportRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_report_file(path: &Path, table: &ClassificationTable) -> Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| AppError::Report(format!("cannot create {}: {}", path.display(), e)))?;
    write_report(file, table)?;
    info!("Wrote {} row(s) to {}", table.len(), path.display());
    Ok(())
}
