use crate::normalize::{HEADWATER_ROW, RepairReport};
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::error::Error;
use std::io::Write;
use std::path::Path;

// One row of the repair report
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    fabric_code: &'a str,
    table: &'a str,
    record: usize,
    field: &'a str,
    before: &'a str,
    after: &'a str,
}

pub fn write_report<W: Write>(
    wtr: &mut Writer<W>,
    fabric_code: &str,
    report: &RepairReport,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    wtr.write_record(["fabric_code", "table", "record", "field", "before", "after"])?;
    for change in &report.changes {
        wtr.serialize(ReportRow {
            fabric_code,
            table: "river",
            record: HEADWATER_ROW,
            field: &change.field,
            before: &change.before,
            after: &change.after,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

// Create CSV writer and write the report
pub fn save_report(
    path: &Path,
    fabric_code: &str,
    report: &RepairReport,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;
    write_report(&mut wtr, fabric_code, report)
}
