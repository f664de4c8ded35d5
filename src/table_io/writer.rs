// src/table_io/writer.rs

use anyhow::{Context, Result};
use log::{debug, warn};
use rust_xlsxwriter::Workbook;
use std::path::Path;

use crate::models::core::{CellValue, Table};
use crate::utils::constants::{SPREADSHEET_MAX_CELL_CHARS, SPREADSHEET_MAX_ROWS};

/// What happened to one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { rows: usize },
    /// The format cannot hold this many rows; nothing was written.
    SkippedRowLimit { rows: usize, limit: usize },
}

/// Writes the table, header included, as CSV. CSV has no row ceiling.
pub fn write_csv(table: &Table, path: &Path) -> Result<ExportOutcome> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    writer
        .write_record(&table.columns)
        .with_context(|| format!("Failed to write CSV header to {}", path.display()))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .with_context(|| format!("Failed to write CSV row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    Ok(ExportOutcome::Written {
        rows: table.len(),
    })
}

/// Whether `rows` data rows plus a header fit in one worksheet.
pub fn fits_spreadsheet(rows: usize) -> bool {
    fits_row_limit(rows, SPREADSHEET_MAX_ROWS)
}

fn fits_row_limit(rows: usize, limit: usize) -> bool {
    rows < limit
}

/// Writes the table to a single-sheet workbook. Tables that exceed the sheet
/// row ceiling are skipped with a warning rather than failing the run.
pub fn write_xlsx(table: &Table, path: &Path) -> Result<ExportOutcome> {
    write_xlsx_with_limit(table, path, SPREADSHEET_MAX_ROWS)
}

/// [`write_xlsx`] with an explicit row ceiling (header row included).
pub fn write_xlsx_with_limit(table: &Table, path: &Path, row_limit: usize) -> Result<ExportOutcome> {
    if !fits_row_limit(table.len(), row_limit) {
        warn!(
            "Number of rows ({}) exceeds the spreadsheet limit of {}; skipping {}",
            table.len(),
            row_limit,
            path.display()
        );
        return Ok(ExportOutcome::SkippedRowLimit {
            rows: table.len(),
            limit: row_limit,
        });
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name.as_str())
            .with_context(|| format!("Failed to write header '{}'", name))?;
    }

    let mut truncated = 0usize;
    for (row_idx, row) in table.rows.iter().enumerate() {
        let sheet_row = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Null => {}
                CellValue::Integer(i) => {
                    worksheet.write_number(sheet_row, col, *i as f64)?;
                }
                CellValue::Float(x) if x.is_finite() => {
                    worksheet.write_number(sheet_row, col, *x)?;
                }
                CellValue::Boolean(b) => {
                    worksheet.write_boolean(sheet_row, col, *b)?;
                }
                other => {
                    let text = other.to_string();
                    let text = if text.chars().count() > SPREADSHEET_MAX_CELL_CHARS {
                        truncated += 1;
                        text.chars().take(SPREADSHEET_MAX_CELL_CHARS).collect()
                    } else {
                        text
                    };
                    worksheet
                        .write_string(sheet_row, col, &text)
                        .with_context(|| {
                            format!("Failed to write cell ({}, {}) to {}", sheet_row, col, path.display())
                        })?;
                }
            }
        }
    }

    if truncated > 0 {
        warn!(
            "{} cells exceeded {} characters and were truncated in {}",
            truncated,
            SPREADSHEET_MAX_CELL_CHARS,
            path.display()
        );
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook {}", path.display()))?;
    debug!("Saved workbook {} ({} rows)", path.display(), table.len());

    Ok(ExportOutcome::Written {
        rows: table.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_io::reader::read_csv;

    fn sample_table() -> Table {
        let mut table = Table::new(vec![
            "company_name".to_string(),
            "year_founded".to_string(),
            "company_group".to_string(),
        ]);
        table.push_row(vec!["Acme, Inc.".into(), CellValue::Float(1995.0), CellValue::Integer(0)]);
        table.push_row(vec!["Globex".into(), CellValue::Null, CellValue::Integer(-1)]);
        table
    }

    #[test]
    fn test_csv_round_trip_keeps_header_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let outcome = write_csv(&sample_table(), &path).unwrap();
        assert_eq!(outcome, ExportOutcome::Written { rows: 2 });

        let table = read_csv(&path).unwrap();
        assert_eq!(table.columns, vec!["company_name", "year_founded", "company_group"]);
        assert_eq!(table.rows[0][0], CellValue::text("Acme, Inc."));
        assert_eq!(table.rows[0][1], CellValue::text("1995.0"));
        assert_eq!(table.rows[1][1], CellValue::Null);
        assert_eq!(table.rows[1][2], CellValue::text("-1"));
    }

    #[test]
    fn test_xlsx_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let outcome = write_xlsx(&sample_table(), &path).unwrap();
        assert_eq!(outcome, ExportOutcome::Written { rows: 2 });
        assert!(path.exists());
    }

    #[test]
    fn test_xlsx_over_row_limit_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let outcome = write_xlsx_with_limit(&sample_table(), &path, 2).unwrap();
        assert_eq!(outcome, ExportOutcome::SkippedRowLimit { rows: 2, limit: 2 });
        assert!(!path.exists());

        let outcome = write_xlsx_with_limit(&sample_table(), &path, 3).unwrap();
        assert_eq!(outcome, ExportOutcome::Written { rows: 2 });
        assert!(path.exists());
    }

    #[test]
    fn test_spreadsheet_row_ceiling() {
        assert!(fits_spreadsheet(0));
        assert!(fits_spreadsheet(1_048_575));
        assert!(!fits_spreadsheet(1_048_576));
    }
}
