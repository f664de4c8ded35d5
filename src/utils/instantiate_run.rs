use crate::models::stats_models::ResolutionStats;
use chrono::NaiveDateTime;
use log::info;

pub fn create_initial_pipeline_run(
    run_id: &str,
    run_timestamp: NaiveDateTime,
    input_file: &str,
    description: Option<&str>,
) -> ResolutionStats {
    info!("Created initial pipeline run record with ID: {}", run_id);

    ResolutionStats {
        run_id: run_id.to_string(),
        run_timestamp,
        description: description.map(|s| s.to_string()),
        input_file: input_file.to_string(),
        total_rows: 0,
        defaulted_columns: Vec::new(),
        empty_keys: 0,
        total_groups: 0,
        grouped_rows: 0,
        unique_rows: 0,
        encoder_stats: None,
        cluster_stats: None,
        exports_written: Vec::new(),
        exports_skipped: Vec::new(),
        load_time: 0.0,
        key_building_time: 0.0,
        encoding_time: 0.0,
        clustering_time: 0.0,
        partition_time: 0.0,
        export_time: 0.0,
        total_processing_time: 0.0,
    }
}
