// src/matching/composite_key.rs - Per-row comparison keys
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::core::{CellValue, Table};

static DISALLOWED_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 ]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalizes one raw field value: lowercase, trimmed, only `a-z`, `0-9`
/// and single spaces. Nulls become the empty string.
pub fn clean_text(value: &CellValue) -> String {
    if value.is_null() {
        return String::new();
    }
    clean_str(&value.to_string())
}

/// String form of [`clean_text`].
pub fn clean_str(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = DISALLOWED_CHARS.replace_all(lowered.trim(), "");
    let collapsed = WHITESPACE_RUN.replace_all(&stripped, " ");
    // Removing characters can expose new edge spaces ("abc !" -> "abc ").
    collapsed.trim().to_string()
}

/// Joins the cleaned values of `fields` with single spaces. Empty values keep
/// their slot in the join.
pub fn create_composite_key(row: &[CellValue], field_indices: &[usize]) -> String {
    field_indices
        .iter()
        .map(|&idx| row.get(idx).map(clean_text).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the composite key of every row. Column positions are resolved once;
/// every field must exist, so run [`super::schema::reconcile_schema`] first.
pub fn build_composite_keys(table: &Table, fields: &[String]) -> Result<Vec<String>> {
    let field_indices = resolve_field_indices(table, fields)?;
    Ok(table
        .rows
        .iter()
        .map(|row| create_composite_key(row, &field_indices))
        .collect())
}

pub fn resolve_field_indices(table: &Table, fields: &[String]) -> Result<Vec<usize>> {
    fields
        .iter()
        .map(|field| {
            table.column_index(field).ok_or_else(|| {
                anyhow!(
                    "Key field '{}' is not present in the table; reconcile the schema first",
                    field
                )
            })
        })
        .collect()
}

/// True when a key carries no comparable content.
pub fn is_empty_key(key: &str) -> bool {
    key.trim().is_empty()
}
