// src/utils/env.rs

use log::{debug, info};
use std::env;
use std::path::PathBuf;

use crate::utils::constants::DEFAULT_INPUT_FILE;

/// Loads variables from a `.env` file if one is present. Existing process
/// variables are never overridden.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}

/// Input table location, `INPUT_FILE` or the fixed default name.
pub fn input_path() -> PathBuf {
    env::var("INPUT_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_INPUT_FILE))
}

/// Directory receiving every export, `OUTPUT_DIR` or the working directory.
pub fn output_dir() -> PathBuf {
    env::var("OUTPUT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
