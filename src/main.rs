use anyhow::{Context, Result};
use chrono::Utc;
use dedupe_lib::models::stats_models::PipelineStage;
use dedupe_lib::pipeline::resolve_entities;
use dedupe_lib::table_io::{export_outcome, read_table, write_run_summary};
use dedupe_lib::utils::env::{input_path, load_env, output_dir};
use dedupe_lib::utils::get_memory_usage;
use dedupe_lib::utils::instantiate_run::create_initial_pipeline_run;
use dedupe_lib::utils::progress_bars::logging::{
    log_pipeline_completion, log_pipeline_start, StageLogger,
};
use dedupe_lib::utils::progress_bars::progress_config::ProgressConfig;
use dedupe_lib::utils::resolution_config::ResolutionConfig;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::time::Instant;
use uuid::Uuid;

fn main() -> Result<()> {
    // Initialize logging and environment
    env_logger::init();
    info!("Starting company entity resolution pipeline");
    load_env();

    let config = ResolutionConfig::from_env();
    config.validate().context("Invalid resolution configuration")?;
    config.log_config();

    // Load progress configuration from environment
    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );
    let multi_progress = progress_config.create_multi_progress();
    let detail_progress = if progress_config.should_show_detailed() {
        multi_progress.as_ref()
    } else {
        None
    };

    // Create main pipeline progress bar
    let main_pb = if let Some(mp) = &multi_progress {
        let pb = mp.add(ProgressBar::new(3));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_message("Initializing pipeline...");
        Some(pb)
    } else {
        None
    };

    let update_main_pb_message = |pb: &ProgressBar, phase_name: &str| {
        if progress_config.should_show_memory() {
            pb.set_message(format!("{} (Memory: {} MB)", phase_name, get_memory_usage()));
        } else {
            pb.set_message(phase_name.to_string());
        }
    };

    let input = input_path();
    let output = output_dir();
    let run_id = Uuid::new_v4().to_string();
    let run_timestamp = Utc::now().naive_utc();
    let mut stats = create_initial_pipeline_run(
        &run_id,
        run_timestamp,
        &input.display().to_string(),
        Some("Company entity resolution run"),
    );
    log_pipeline_start(
        &run_id,
        &input.display().to_string(),
        config.eps,
        config.min_samples,
    );
    let pipeline_start = Instant::now();

    // Phase 1: Load
    if let Some(pb) = &main_pb {
        update_main_pb_message(pb, "Phase 1: Loading input table");
    }
    let logger = StageLogger::new(PipelineStage::Load);
    logger.log_start(&format!("reading {}", input.display()));
    let table = read_table(&input)
        .with_context(|| format!("Failed to load input table {}", input.display()))?;
    logger.log_data_loaded(table.len(), "company rows");
    stats.total_rows = table.len();
    stats.load_time = logger.get_elapsed().as_secs_f64();
    if let Some(pb) = &main_pb {
        pb.inc(1);
    }

    // Phase 2: Resolve
    if let Some(pb) = &main_pb {
        update_main_pb_message(pb, "Phase 2: Keys, encoding and grouping");
    }
    let outcome = resolve_entities(table, &config, detail_progress)?;
    info!("Number of valid groups: {}", outcome.group_count());

    stats.defaulted_columns = outcome.defaulted_columns.clone();
    stats.empty_keys = outcome.empty_keys;
    stats.total_groups = outcome.group_count();
    stats.grouped_rows = outcome.partition.grouped.len();
    stats.unique_rows = outcome.partition.unique.len();
    stats.encoder_stats = Some(outcome.encoder_stats.clone());
    stats.cluster_stats = Some(outcome.cluster_stats.clone());
    stats.key_building_time = outcome.stage_time(PipelineStage::KeyBuilding);
    stats.encoding_time = outcome.stage_time(PipelineStage::Encoding);
    stats.clustering_time = outcome.stage_time(PipelineStage::Clustering);
    stats.partition_time = outcome.stage_time(PipelineStage::Partitioning);
    if let Some(pb) = &main_pb {
        pb.inc(1);
    }

    // Phase 3: Export
    if let Some(pb) = &main_pb {
        update_main_pb_message(pb, "Phase 3: Writing exports");
    }
    let export_start = Instant::now();
    let report = export_outcome(&outcome, &output, detail_progress)?;
    stats.export_time = export_start.elapsed().as_secs_f64();
    stats.exports_written = report
        .written
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    stats.exports_skipped = report
        .skipped
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    if let Some(pb) = &main_pb {
        pb.inc(1);
        pb.finish_with_message(format!(
            "Pipeline complete: {} groups",
            stats.total_groups
        ));
    }

    let total_time = pipeline_start.elapsed();
    stats.total_processing_time = total_time.as_secs_f64();
    let summary_path = write_run_summary(&stats, &output)?;
    info!("Run summary saved in: {}", summary_path.display());

    log_pipeline_completion(&stats, total_time);
    if progress_config.should_show_memory() {
        info!("Final memory usage: {} MB", get_memory_usage());
    }

    info!("Pipeline completed successfully!");
    Ok(())
}
