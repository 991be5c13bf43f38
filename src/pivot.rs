//! Pivoting of long datapoint rows into a date-indexed wide table.
//!
//! Columns are exactly the names the caller asked for, in the order asked,
//! whether or not any data exists for them. Rows are the dates that carry at
//! least one requested value, in the order they were first seen; no calendar
//! filling takes place.

use chrono::NaiveDate;
use seahash::SeaHasher;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

use crate::datatype::{DATE_FORMAT, Datapoint};
use crate::error::{Error, Result};

type CellHasher = BuildHasherDefault<SeaHasher>;

#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    columns: Vec<String>,
    rows: Vec<(NaiveDate, Vec<Option<f64>>)>,
}

impl WideTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    /// Dated rows, each with one cell per column.
    pub fn rows(&self) -> &[(NaiveDate, Vec<Option<f64>>)] {
        &self.rows
    }
    pub fn get(&self, date: NaiveDate, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|(d, _)| *d == date)
            .and_then(|(_, cells)| cells[col])
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Spreads `datapoints` (ascending by date) over `columns`.
pub fn pivot<'a, I>(datapoints: I, columns: &[String]) -> WideTable
where
    I: IntoIterator<Item = &'a Datapoint>,
{
    // a name may be requested twice and then fills both columns
    let mut positions: HashMap<&str, Vec<usize>, CellHasher> = HashMap::default();
    for (i, column) in columns.iter().enumerate() {
        positions.entry(column.as_str()).or_default().push(i);
    }
    let mut index: HashMap<NaiveDate, usize, CellHasher> = HashMap::default();
    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for datapoint in datapoints {
        let Some(targets) = positions.get(datapoint.name.as_str()) else {
            continue;
        };
        let row = *index.entry(datapoint.date).or_insert_with(|| {
            rows.push((datapoint.date, vec![None; columns.len()]));
            rows.len() - 1
        });
        for &col in targets {
            rows[row].1[col] = Some(datapoint.value);
        }
    }
    WideTable { columns: columns.to_vec(), rows }
}

/// Header `,A,B`, then `date,a,b` per row with empty cells for missing
/// values; every line, the last included, ends with a newline.
pub fn render_csv(table: &WideTable) -> Result<String> {
    if table.columns.is_empty() {
        // the csv writer quotes a lone empty field
        return Ok(",\n".to_string());
    }
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(std::iter::once("").chain(table.columns.iter().map(String::as_str)))?;
    for (date, cells) in &table.rows {
        let mut record = Vec::with_capacity(cells.len() + 1);
        record.push(date.format(DATE_FORMAT).to_string());
        record.extend(cells.iter().map(|cell| cell.map(|v| v.to_string()).unwrap_or_default()));
        writer.write_record(&record)?;
    }
    let bytes = writer.into_inner().map_err(|e| Error::Encoding(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Encoding(e.to_string()))
}

/// Array of `{name, freq, date, value}` in the order given.
pub fn render_json(datapoints: &[Datapoint]) -> Result<String> {
    serde_json::to_string(datapoints).map_err(|e| Error::Encoding(e.to_string()))
}
