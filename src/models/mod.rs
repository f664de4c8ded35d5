pub mod core;
pub mod stats_models;

pub use self::core::{CellValue, Table};
