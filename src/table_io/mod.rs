pub mod export;
pub mod reader;
pub mod writer;

pub use export::{export_outcome, export_outcome_with_limit, write_run_summary, ExportReport};
pub use reader::read_table;
