// File: crates/export-cli/src/table.rs
// Summary: Load a CSV table into per-column chart data and tabular rows.

use std::path::Path;

use anyhow::{Context, Result};
use chart_export::Row;
use serde_json::Value;

/// One numeric column, ready to become a chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub header: String,
    /// (x, y) points; x is the parsed first column, or the row index when it is not numeric.
    pub points: Vec<(f64, f64)>,
    /// `{<x header>: x, "value": y}` per non-empty cell, for CSV export.
    pub rows: Vec<Row>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub x_header: String,
    pub columns: Vec<Column>,
}

pub fn load_table(path: &Path) -> Result<Table> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    read_table(rdr)
}

pub fn parse_table(text: &str) -> Result<Table> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    read_table(rdr)
}

fn read_table<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Table> {
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let Some(x_header) = headers.first().cloned() else {
        anyhow::bail!("CSV has no header row");
    };

    let mut records = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        records.push(rec.with_context(|| format!("reading record {}", i + 1))?);
    }

    let mut columns = Vec::new();
    for (col, header) in headers.iter().enumerate().skip(1) {
        let cells: Vec<&str> = records.iter().map(|r| r.get(col).unwrap_or("")).collect();
        if !is_numeric(&cells) {
            log::debug!("Skipping non-numeric column '{header}'");
            continue;
        }

        let mut points = Vec::new();
        let mut rows = Vec::new();
        for (i, (rec, cell)) in records.iter().zip(&cells).enumerate() {
            let Ok(y) = cell.parse::<f64>() else { continue };
            let raw_x = rec.get(0).unwrap_or("");
            let x = raw_x.parse::<f64>().unwrap_or(i as f64);
            points.push((x, y));

            let mut row = Row::new();
            row.insert(x_header.clone(), cell_value(raw_x));
            row.insert("value".to_string(), cell_value(cell));
            rows.push(row);
        }
        columns.push(Column { header: header.clone(), points, rows });
    }

    Ok(Table { x_header, columns })
}

/// Every non-empty cell parses as a number, and there is at least one.
fn is_numeric(cells: &[&str]) -> bool {
    let mut any = false;
    for cell in cells.iter().filter(|c| !c.is_empty()) {
        if cell.parse::<f64>().is_err() {
            return false;
        }
        any = true;
    }
    any
}

/// Integers and finite floats become JSON numbers; everything else stays text.
fn cell_value(cell: &str) -> Value {
    if let Ok(n) = cell.parse::<i64>() {
        return Value::from(n);
    }
    cell.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_columns_become_series() {
        let table = parse_table("year,gdp,region,cpi\n2020,1.5,north,2\n2021,,south,2.5\n2022,2.25,east,3\n")
            .expect("parse");
        assert_eq!(table.x_header, "year");
        let headers: Vec<&str> = table.columns.iter().map(|c| c.header.as_str()).collect();
        assert_eq!(headers, vec!["gdp", "cpi"]);

        let gdp = &table.columns[0];
        assert_eq!(gdp.points, vec![(2020.0, 1.5), (2022.0, 2.25)]);
        assert_eq!(gdp.rows.len(), 2);
        assert_eq!(gdp.rows[0]["year"], Value::from(2020));
        assert_eq!(gdp.rows[0]["value"], Value::from(1.5));
    }

    #[test]
    fn text_x_values_fall_back_to_row_index() {
        let table = parse_table("month,rent\nJan,900\nFeb,910\n").expect("parse");
        let rent = &table.columns[0];
        assert_eq!(rent.points, vec![(0.0, 900.0), (1.0, 910.0)]);
        assert_eq!(rent.rows[1]["month"], Value::from("Feb"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_table("").is_err());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("wages.csv");
        std::fs::write(&path, "year,wages\n2019,100\n2020,103.5\n").expect("write");
        let table = load_table(&path).expect("load");
        assert_eq!(table.columns[0].points.len(), 2);
    }
}
