// src/models/stats_models.rs

use chrono::NaiveDateTime;
use serde::Serialize;

/// The sequential stages of one resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineStage {
    Load,
    KeyBuilding,
    Encoding,
    Clustering,
    Partitioning,
    Export,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Load => "LOAD",
            PipelineStage::KeyBuilding => "KEYS",
            PipelineStage::Encoding => "ENCODE",
            PipelineStage::Clustering => "CLUSTER",
            PipelineStage::Partitioning => "PARTITION",
            PipelineStage::Export => "EXPORT",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            PipelineStage::Load => "📥",
            PipelineStage::KeyBuilding => "🔑",
            PipelineStage::Encoding => "🧮",
            PipelineStage::Clustering => "🧭",
            PipelineStage::Partitioning => "🗂️",
            PipelineStage::Export => "💾",
        }
    }
}

/// Statistics reported by the similarity encoder after fitting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncoderStats {
    pub documents: usize,
    pub vocabulary_size: usize,
    pub zero_vectors: usize,
    pub stored_entries: usize,
}

/// Statistics reported by the density grouper.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusteringStats {
    /// Points handed to the clustering step (non-zero vectors only).
    pub points_clustered: usize,
    pub core_points: usize,
    pub border_points: usize,
    pub noise_points: usize,
    pub clusters: usize,
    pub largest_cluster: usize,
    /// True when clustering was skipped because no row had a usable key.
    pub skipped: bool,
}

/// Run-level statistics for one resolution pipeline execution.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub description: Option<String>,
    pub input_file: String,
    pub total_rows: usize,
    pub defaulted_columns: Vec<String>,
    pub empty_keys: usize,
    pub total_groups: usize,
    pub grouped_rows: usize,
    pub unique_rows: usize,
    pub encoder_stats: Option<EncoderStats>,
    pub cluster_stats: Option<ClusteringStats>,
    pub exports_written: Vec<String>,
    pub exports_skipped: Vec<String>,
    pub load_time: f64,
    pub key_building_time: f64,
    pub encoding_time: f64,
    pub clustering_time: f64,
    pub partition_time: f64,
    pub export_time: f64,
    pub total_processing_time: f64,
}
