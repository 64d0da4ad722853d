// File: crates/export-core/src/tabular.rs
// Summary: CSV text construction for chart data (BOM-prefixed, presentation columns stripped).

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use serde_json::Value;

use crate::error::{ExportError, Result};
use crate::request::Row;

/// UTF-8 byte-order mark; spreadsheet apps use it to detect the encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Styling keys charting code attaches to rows. Never part of a data export.
pub const EXCLUDED_COLUMNS: [&str; 2] = ["color", "fill"];

/// Column set taken from the first row, in its key order, without presentation keys.
pub fn columns(rows: &[Row]) -> Vec<&str> {
    rows.first()
        .map(|first| {
            first
                .keys()
                .map(String::as_str)
                .filter(|k| !EXCLUDED_COLUMNS.contains(k))
                .collect()
        })
        .unwrap_or_default()
}

/// Text form of one cell. Null renders empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

/// Serialize rows to CSV bytes: BOM, header line, one line per row.
pub fn build_csv(rows: &[Row]) -> Result<Vec<u8>> {
    let cols = columns(rows);
    if cols.is_empty() {
        return Err(ExportError::NoData);
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(UTF8_BOM.to_vec());

    write_line(&mut writer, cols.iter().map(|c| c.to_string()).collect())?;
    for row in rows {
        let record = cols
            .iter()
            .map(|c| row.get(*c).map(cell_text).unwrap_or_default())
            .collect();
        write_line(&mut writer, record)?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::EncodingFailed(e.to_string()))
}

/// The csv writer emits a lone empty field as `""`; a blank line is written instead.
fn write_line(writer: &mut Writer<Vec<u8>>, fields: Vec<String>) -> Result<()> {
    if let [only] = fields.as_slice() {
        if only.is_empty() {
            writer.flush()?;
            writer.get_mut().push(b'\n');
            return Ok(());
        }
    }
    writer
        .write_record(&fields)
        .map_err(|e| ExportError::EncodingFailed(e.to_string()))
}
