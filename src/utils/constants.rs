// src/utils/constants.rs

/// Columns concatenated into the composite key, in key order.
pub const DEFAULT_KEY_FIELDS: [&str; 7] = [
    "company_name",
    "company_legal_names",
    "company_commercial_names",
    "year_founded",
    "short_description",
    "naics_2022_primary_label",
    "generated_business_tags",
];

/// Maximum cosine distance for two rows to be neighbours.
pub const DEFAULT_EPS: f64 = 0.2;
/// Neighbourhood size (including the point itself) required for a core point.
pub const DEFAULT_MIN_SAMPLES: usize = 3;

/// Group id for rows that belong to no group.
pub const NOISE_GROUP: i64 = -1;

pub const COMPOSITE_KEY_COLUMN: &str = "composite_key";
pub const GROUP_COLUMN: &str = "company_group";

/// Character n-gram range used by the similarity encoder (inclusive).
pub const MIN_NGRAM: usize = 2;
pub const MAX_NGRAM: usize = 4;

/// Hard row ceiling of the spreadsheet format, header row included.
pub const SPREADSHEET_MAX_ROWS: usize = 1_048_576;
/// Maximum characters a spreadsheet cell can hold.
pub const SPREADSHEET_MAX_CELL_CHARS: usize = 32_767;

pub const DEFAULT_INPUT_FILE: &str = "veridion_entity_resolution_challenge.snappy.parquet";
pub const OUTPUT_CSV_FILE: &str = "veridion_entity_resolution_composite_updated.csv";
pub const OUTPUT_XLSX_FILE: &str = "veridion_entity_resolution_composite_updated.xlsx";
pub const DUPLICATES_XLSX_FILE: &str = "duplicates.xlsx";
pub const UNIQUES_XLSX_FILE: &str = "uniques.xlsx";
pub const RUN_SUMMARY_FILE: &str = "resolution_summary.json";
