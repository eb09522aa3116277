//! CSV loading for the command-line oracle.

use crate::error::DatasetError;
use csv::{ReaderBuilder, Trim};
use ndarray::Array2;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns read by the reference tooling
pub const DEFAULT_COLUMNS: [&str; 2] = ["x", "y"];

/// Load the named numeric columns of a headered CSV file into an `n x d`
/// point set. An empty `columns` slice selects every column.
pub fn load_csv<P: AsRef<Path>>(path: P, columns: &[&str]) -> Result<Array2<f64>, DatasetError> {
    let file = File::open(path)?;
    read_csv(file, columns)
}

/// Same as [`load_csv`], reading from any source.
pub fn read_csv<R: Read>(reader: R, columns: &[&str]) -> Result<Array2<f64>, DatasetError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let indices: Vec<usize> = if columns.is_empty() {
        (0..headers.len()).collect()
    } else {
        columns
            .iter()
            .map(|&name| {
                headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
            })
            .collect::<Result<_, _>>()?
    };

    let n_features = indices.len();
    let mut values = Vec::new();
    let mut n_rows = 0;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        for &idx in &indices {
            let field = record.get(idx).unwrap_or("");
            let value = field.parse::<f64>().map_err(|_| DatasetError::NotNumeric {
                row: row + 1,
                column: headers.get(idx).unwrap_or("").to_string(),
                value: field.to_string(),
            })?;
            values.push(value);
        }
        n_rows += 1;
    }

    if n_rows == 0 || n_features == 0 {
        return Err(DatasetError::Empty);
    }

    Ok(Array2::from_shape_vec((n_rows, n_features), values)?)
}
