// src/utils/progress_bars/logging.rs - Logging helpers for the resolution stages
use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::models::stats_models::{ClusteringStats, EncoderStats, PipelineStage, ResolutionStats};

#[derive(Clone)]
pub struct StageLogger {
    stage_name: &'static str,
    stage_emoji: &'static str,
    start_time: Instant,
}

impl StageLogger {
    pub fn new(stage: PipelineStage) -> Self {
        Self {
            stage_name: stage.as_str(),
            stage_emoji: stage.emoji(),
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, details: &str) {
        info!(
            "[{}] {} 🚀 Starting: {}",
            self.stage_name, self.stage_emoji, details
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        let msg = if let Some(details) = details {
            format!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, details, elapsed.as_secs_f32()
            )
        } else {
            format!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.stage_name, self.stage_emoji, phase, elapsed.as_secs_f32()
            )
        };
        info!("{}", msg);
    }

    pub fn log_data_loaded(&self, count: usize, data_type: &str) {
        info!(
            "[{}] {} 📊 Loaded {} {}",
            self.stage_name, self.stage_emoji, count, data_type
        );
    }

    pub fn log_data_quality_issue(&self, issue_type: &str, count: usize) {
        if count > 0 {
            warn!(
                "[{}] {} ⚠️  Data quality: {} instances of {}",
                self.stage_name, self.stage_emoji, count, issue_type
            );
        }
    }

    pub fn log_completion(&self, summary: &str) {
        info!(
            "[{}] {} ✅ Completed in {:.2?}: {}",
            self.stage_name,
            self.stage_emoji,
            self.start_time.elapsed(),
            summary
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn log_debug(&self, message: &str) {
        debug!("[{}] {} {}", self.stage_name, self.stage_emoji, message);
    }

    pub fn get_elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

// Pipeline-level logging functions
pub fn log_pipeline_start(run_id: &str, input_file: &str, eps: f64, min_samples: usize) {
    info!("🚀 ===== COMPANY ENTITY RESOLUTION STARTING =====");
    info!("📅 Pipeline Run ID: {}", run_id);
    info!("📄 Input: {}", input_file);
    info!("⚙️  Configuration:");
    info!("   • Similarity: char n-grams (2-4, word bounded), TF-IDF weighted");
    info!("   • Grouping: density-based, cosine eps={}, min_samples={}", eps, min_samples);
    info!("================================================");
}

pub fn log_encoder_stats(stats: &EncoderStats) {
    info!(
        "🧮 Encoder: {} documents, {} n-gram features, {} stored weights, {} empty vectors",
        stats.documents, stats.vocabulary_size, stats.stored_entries, stats.zero_vectors
    );
}

pub fn log_clustering_stats(stats: &ClusteringStats) {
    if stats.skipped {
        warn!("🧭 Clustering skipped: no row produced a usable composite key");
        return;
    }
    info!(
        "🧭 Clustering: {} points → {} core, {} border, {} noise",
        stats.points_clustered, stats.core_points, stats.border_points, stats.noise_points
    );
    info!(
        "🧭 Clusters: {} (largest has {} rows)",
        stats.clusters, stats.largest_cluster
    );
}

pub fn log_pipeline_completion(stats: &ResolutionStats, duration: Duration) {
    info!("🎉 ===== COMPANY ENTITY RESOLUTION COMPLETED =====");
    info!("📅 Pipeline Run ID: {}", stats.run_id);
    info!("⏱️  Total Duration: {:.2?}", duration);
    info!("📊 Rows: {} total, {} with empty keys", stats.total_rows, stats.empty_keys);
    info!("🎯 Number of valid groups: {}", stats.total_groups);
    info!(
        "   • {} rows in groups, {} unique rows",
        stats.grouped_rows, stats.unique_rows
    );
    if !stats.defaulted_columns.is_empty() {
        info!("   • Defaulted columns: {:?}", stats.defaulted_columns);
    }
    info!("=== Timing Breakdown ===");
    info!("Load: {:.2}s", stats.load_time);
    info!("Key building: {:.2}s", stats.key_building_time);
    info!("Encoding: {:.2}s", stats.encoding_time);
    info!("Clustering: {:.2}s", stats.clustering_time);
    info!("Partitioning: {:.2}s", stats.partition_time);
    info!("Export: {:.2}s", stats.export_time);
    for export in &stats.exports_written {
        info!("💾 Written: {}", export);
    }
    for export in &stats.exports_skipped {
        warn!("⏭️  Skipped: {}", export);
    }
    info!("===============================================");
}
