// src/table_io/export.rs - Persisting one run's results

use anyhow::{Context, Result};
use indicatif::MultiProgress;
use log::info;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::models::stats_models::{PipelineStage, ResolutionStats};
use crate::pipeline::ResolutionOutcome;
use crate::table_io::writer::{write_csv, write_xlsx_with_limit, ExportOutcome};
use crate::utils::constants::{
    DUPLICATES_XLSX_FILE, OUTPUT_CSV_FILE, OUTPUT_XLSX_FILE, RUN_SUMMARY_FILE,
    SPREADSHEET_MAX_ROWS, UNIQUES_XLSX_FILE,
};
use crate::utils::progress_bars::logging::StageLogger;
use crate::utils::progress_bars::progress_config::stage_progress_bar;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl ExportReport {
    fn record(&mut self, path: PathBuf, outcome: ExportOutcome) {
        match outcome {
            ExportOutcome::Written { .. } => self.written.push(path),
            ExportOutcome::SkippedRowLimit { .. } => self.skipped.push(path),
        }
    }
}

/// Writes the annotated table (CSV always, spreadsheet when it fits), the
/// duplicates view and the uniques view into `output_dir`. A skipped
/// spreadsheet never prevents the remaining exports.
pub fn export_outcome(
    outcome: &ResolutionOutcome,
    output_dir: &Path,
    multi_progress: Option<&MultiProgress>,
) -> Result<ExportReport> {
    export_outcome_with_limit(outcome, output_dir, multi_progress, SPREADSHEET_MAX_ROWS)
}

/// [`export_outcome`] with an explicit spreadsheet row ceiling.
pub fn export_outcome_with_limit(
    outcome: &ResolutionOutcome,
    output_dir: &Path,
    multi_progress: Option<&MultiProgress>,
    row_limit: usize,
) -> Result<ExportReport> {
    let logger = StageLogger::new(PipelineStage::Export);
    logger.log_start(&format!("writing results to {}", output_dir.display()));
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let pb = stage_progress_bar(multi_progress, 4, "Writing exports...");
    let mut report = ExportReport::default();

    let csv_path = output_dir.join(OUTPUT_CSV_FILE);
    let result = write_csv(&outcome.table, &csv_path)?;
    info!("Updated dataset saved as CSV: {}", csv_path.display());
    report.record(csv_path, result);
    if let Some(pb) = &pb {
        pb.inc(1);
    }

    let xlsx_path = output_dir.join(OUTPUT_XLSX_FILE);
    let result = write_xlsx_with_limit(&outcome.table, &xlsx_path, row_limit)?;
    match result {
        ExportOutcome::Written { .. } => {
            info!("Updated dataset saved as Excel: {}", xlsx_path.display())
        }
        ExportOutcome::SkippedRowLimit { .. } => {
            logger.log_warning("Number of rows exceeds Excel's limit; saved only as CSV.")
        }
    }
    report.record(xlsx_path, result);
    if let Some(pb) = &pb {
        pb.inc(1);
    }

    let duplicates_path = output_dir.join(DUPLICATES_XLSX_FILE);
    let result = write_xlsx_with_limit(&outcome.duplicates(), &duplicates_path, row_limit)?;
    match result {
        ExportOutcome::Written { .. } => {
            info!("Duplicate companies saved in: {}", duplicates_path.display())
        }
        ExportOutcome::SkippedRowLimit { rows, .. } => logger.log_warning(&format!(
            "{} duplicate rows exceed Excel's limit; {} not written.",
            rows,
            duplicates_path.display()
        )),
    }
    report.record(duplicates_path, result);
    if let Some(pb) = &pb {
        pb.inc(1);
    }

    let uniques_path = output_dir.join(UNIQUES_XLSX_FILE);
    let result = write_xlsx_with_limit(&outcome.uniques(), &uniques_path, row_limit)?;
    match result {
        ExportOutcome::Written { .. } => {
            info!("Unique companies saved in: {}", uniques_path.display())
        }
        ExportOutcome::SkippedRowLimit { rows, .. } => logger.log_warning(&format!(
            "{} unique rows exceed Excel's limit; {} not written.",
            rows,
            uniques_path.display()
        )),
    }
    report.record(uniques_path, result);
    if let Some(pb) = &pb {
        pb.finish_with_message("Exports written");
    }

    logger.log_completion(&format!(
        "{} exports written, {} skipped",
        report.written.len(),
        report.skipped.len()
    ));
    Ok(report)
}

/// Saves run statistics as pretty-printed JSON.
pub fn write_run_summary(stats: &ResolutionStats, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(RUN_SUMMARY_FILE);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create run summary {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), stats)
        .with_context(|| format!("Failed to serialize run summary to {}", path.display()))?;
    Ok(path)
}
