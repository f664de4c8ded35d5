// src/lib.rs
pub mod clustering;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod table_io;
pub mod utils;

pub use pipeline::{resolve_entities, ResolutionOutcome};
