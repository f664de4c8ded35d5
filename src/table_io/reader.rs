// src/table_io/reader.rs

use anyhow::{bail, Context, Result};
use log::{debug, info};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::models::core::{CellValue, Table};

/// Loads the input table, choosing the format from the file extension.
pub fn read_table(path: &Path) -> Result<Table> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let table = match extension.as_deref() {
        Some("parquet") => read_parquet(path)?,
        Some("csv") => read_csv(path)?,
        _ => bail!(
            "Unsupported input format for {} (expected .parquet or .csv)",
            path.display()
        ),
    };

    info!(
        "Read {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

pub fn read_parquet(path: &Path) -> Result<Table> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open parquet file {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("Failed to read parquet metadata from {}", path.display()))?;

    let columns: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema()
        .get_fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();
    let column_positions: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    debug!("Parquet schema columns: {:?}", columns);

    let mut table = Table::new(columns.clone());
    let rows = reader
        .get_row_iter(None)
        .with_context(|| format!("Failed to iterate rows of {}", path.display()))?;

    for (row_number, row) in rows.enumerate() {
        let row = row.with_context(|| {
            format!("Failed to decode row {} of {}", row_number, path.display())
        })?;
        let mut cells = vec![CellValue::Null; columns.len()];
        for (name, field) in row.get_column_iter() {
            if let Some(&idx) = column_positions.get(name.as_str()) {
                cells[idx] = field_to_cell(field);
            }
        }
        table.push_row(cells);
    }

    Ok(table)
}

fn field_to_cell(field: &Field) -> CellValue {
    match field {
        Field::Null => CellValue::Null,
        Field::Bool(b) => CellValue::Boolean(*b),
        Field::Byte(v) => CellValue::Integer(i64::from(*v)),
        Field::Short(v) => CellValue::Integer(i64::from(*v)),
        Field::Int(v) => CellValue::Integer(i64::from(*v)),
        Field::Long(v) => CellValue::Integer(*v),
        Field::UByte(v) => CellValue::Integer(i64::from(*v)),
        Field::UShort(v) => CellValue::Integer(i64::from(*v)),
        Field::UInt(v) => CellValue::Integer(i64::from(*v)),
        Field::Float(v) => CellValue::Float(f64::from(*v)),
        Field::Double(v) => CellValue::Float(*v),
        Field::Str(s) => CellValue::Text(s.clone()),
        // Lists, maps, dates and the rest keep parquet's own rendering.
        other => CellValue::Text(other.to_string()),
    }
}

/// Reads a CSV file with a header row. Every cell is text; empty cells are null.
pub fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header of {}", path.display()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = Table::new(columns);
    for (row_number, record) in reader.records().enumerate() {
        let record = record.with_context(|| {
            format!("Malformed CSV record {} in {}", row_number + 1, path.display())
        })?;
        table.push_row(
            record
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::text(cell)
                    }
                })
                .collect(),
        );
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv_with_empty_cells() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "company_name,year_founded").unwrap();
        writeln!(file, "\"Acme, Inc.\",1995").unwrap();
        writeln!(file, "Globex,").unwrap();
        file.flush().unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.columns, vec!["company_name", "year_founded"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0], CellValue::text("Acme, Inc."));
        assert_eq!(table.rows[1][1], CellValue::Null);
    }

    #[test]
    fn test_malformed_csv_is_fatal() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a,b").unwrap();
        writeln!(file, "1,2,3").unwrap();
        file.flush().unwrap();
        assert!(read_table(file.path()).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        assert!(read_table(file.path()).is_err());
    }

    #[test]
    fn test_field_conversion() {
        assert_eq!(field_to_cell(&Field::Null), CellValue::Null);
        assert_eq!(field_to_cell(&Field::Int(1995)), CellValue::Integer(1995));
        assert_eq!(field_to_cell(&Field::Double(1995.0)), CellValue::Float(1995.0));
        assert_eq!(
            field_to_cell(&Field::Str("Acme".to_string())),
            CellValue::text("Acme")
        );
    }
}
