// src/matching/schema.rs

use log::{debug, warn};

use crate::models::core::{CellValue, Table};

/// A table in which every configured key field exists and holds no nulls.
#[derive(Debug, Clone)]
pub struct ReconciledTable {
    pub table: Table,
    /// Configured fields that were absent from the input and defaulted to "".
    pub defaulted_columns: Vec<String>,
    /// Null cells in configured fields that were replaced with "".
    pub filled_cells: usize,
}

/// Makes the configured key fields present and non-null across the whole
/// table. Missing columns are created with empty strings and reported once
/// each; null cells in existing key columns become empty strings.
pub fn reconcile_schema(mut table: Table, fields: &[String]) -> ReconciledTable {
    let mut defaulted_columns = Vec::new();
    let mut filled_cells = 0;

    for field in fields {
        match table.column_index(field) {
            Some(idx) => {
                for row in &mut table.rows {
                    if row[idx].is_null() {
                        row[idx] = CellValue::text("");
                        filled_cells += 1;
                    }
                }
            }
            None => {
                // A field listed twice is only defaulted once.
                if defaulted_columns.contains(field) {
                    continue;
                }
                warn!(
                    "Warning: Column '{}' not found. Using an empty string as default.",
                    field
                );
                table.add_column(field.clone(), CellValue::text(""));
                defaulted_columns.push(field.clone());
            }
        }
    }

    debug!(
        "Schema reconciled: {} columns defaulted, {} null cells filled",
        defaulted_columns.len(),
        filled_cells
    );

    ReconciledTable {
        table,
        defaulted_columns,
        filled_cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_column_is_defaulted_table_wide() {
        let mut table = Table::new(fields(&["company_name"]));
        table.push_row(vec!["Acme".into()]);
        table.push_row(vec!["Globex".into()]);

        let reconciled = reconcile_schema(table, &fields(&["company_name", "year_founded"]));
        assert_eq!(reconciled.defaulted_columns, vec!["year_founded"]);
        let table = reconciled.table;
        assert_eq!(table.columns, fields(&["company_name", "year_founded"]));
        assert!(table
            .rows
            .iter()
            .all(|r| r[1] == CellValue::text("")));
    }

    #[test]
    fn test_null_cells_are_filled() {
        let mut table = Table::new(fields(&["company_name", "other"]));
        table.push_row(vec![CellValue::Null, CellValue::Null]);
        table.push_row(vec!["Acme".into(), CellValue::Null]);

        let reconciled = reconcile_schema(table, &fields(&["company_name"]));
        assert!(reconciled.defaulted_columns.is_empty());
        assert_eq!(reconciled.filled_cells, 1);
        assert_eq!(reconciled.table.rows[0][0], CellValue::text(""));
        // Columns outside the key are left untouched
        assert_eq!(reconciled.table.rows[0][1], CellValue::Null);
    }

    #[test]
    fn test_duplicate_missing_field_defaulted_once() {
        let table = Table::new(fields(&["a"]));
        let reconciled = reconcile_schema(table, &fields(&["b", "b"]));
        assert_eq!(reconciled.defaulted_columns, vec!["b"]);
        assert_eq!(reconciled.table.columns, fields(&["a", "b"]));
    }
}
