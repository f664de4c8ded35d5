// src/pipeline.rs - The resolution core: table in, annotated table out
//!
//! Stages run strictly in sequence: schema reconciliation, composite keys,
//! TF-IDF encoding, density grouping, partitioning. Nothing feeds back into an
//! earlier stage, and every derived artifact is rebuilt on each call.

use anyhow::{Context, Result};
use indicatif::MultiProgress;
use std::collections::HashMap;
use std::time::Duration;

use crate::clustering::{assign_groups, partition_rows, Partition};
use crate::matching::composite_key::{build_composite_keys, is_empty_key};
use crate::matching::schema::reconcile_schema;
use crate::matching::tfidf::CharNgramTfidf;
use crate::models::core::{CellValue, Table};
use crate::models::stats_models::{ClusteringStats, EncoderStats, PipelineStage};
use crate::utils::constants::{COMPOSITE_KEY_COLUMN, GROUP_COLUMN};
use crate::utils::progress_bars::logging::{log_clustering_stats, log_encoder_stats, StageLogger};
use crate::utils::resolution_config::ResolutionConfig;

/// Everything one resolution run produces.
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    /// Input table with `composite_key` and `company_group` columns set.
    pub table: Table,
    pub composite_keys: Vec<String>,
    /// Group id per row, aligned with `table.rows`.
    pub group_ids: Vec<i64>,
    pub partition: Partition,
    pub defaulted_columns: Vec<String>,
    pub empty_keys: usize,
    pub encoder_stats: EncoderStats,
    pub cluster_stats: ClusteringStats,
    pub stage_times: HashMap<PipelineStage, Duration>,
}

impl ResolutionOutcome {
    /// Rows with a group id, sorted by group id.
    pub fn duplicates(&self) -> Table {
        self.table.select_rows(&self.partition.grouped)
    }

    /// Rows without a group id, in input order.
    pub fn uniques(&self) -> Table {
        self.table.select_rows(&self.partition.unique)
    }

    pub fn group_count(&self) -> usize {
        self.partition.group_count
    }

    pub fn stage_time(&self, stage: PipelineStage) -> f64 {
        self.stage_times
            .get(&stage)
            .map(Duration::as_secs_f64)
            .unwrap_or(0.0)
    }
}

/// Runs the whole resolution core over `table`.
pub fn resolve_entities(
    table: Table,
    config: &ResolutionConfig,
    multi_progress: Option<&MultiProgress>,
) -> Result<ResolutionOutcome> {
    config.validate().context("Invalid resolution configuration")?;
    let mut stage_times = HashMap::new();

    // Keys
    let logger = StageLogger::new(PipelineStage::KeyBuilding);
    logger.log_start(&format!("building composite keys for {} rows", table.len()));
    logger.log_phase("Reconciling schema", Some(&format!("{} key fields", config.fields.len())));
    let reconciled = reconcile_schema(table, &config.fields);
    if !reconciled.defaulted_columns.is_empty() {
        logger.log_debug(&format!("Defaulted columns: {:?}", reconciled.defaulted_columns));
    }
    logger.log_data_quality_issue("missing cells defaulted to empty", reconciled.filled_cells);
    let mut table = reconciled.table;

    let composite_keys = build_composite_keys(&table, &config.fields)
        .context("Failed to build composite keys")?;
    let empty_keys = composite_keys.iter().filter(|k| is_empty_key(k)).count();
    logger.log_data_quality_issue("rows with an empty composite key", empty_keys);
    logger.log_completion(&format!("{} keys built", composite_keys.len()));
    stage_times.insert(PipelineStage::KeyBuilding, logger.get_elapsed());

    // Vectors
    let logger = StageLogger::new(PipelineStage::Encoding);
    logger.log_start("fitting char n-gram TF-IDF over all keys");
    let (fitted, vectors) = CharNgramTfidf::default().fit_transform(composite_keys.as_slice());
    let encoder_stats = fitted.stats(&vectors);
    log_encoder_stats(&encoder_stats);
    logger.log_completion(&format!("{} features", fitted.vocabulary_size()));
    stage_times.insert(PipelineStage::Encoding, logger.get_elapsed());

    // Groups
    let logger = StageLogger::new(PipelineStage::Clustering);
    logger.log_start(&format!(
        "density grouping (eps={}, min_samples={})",
        config.eps, config.min_samples
    ));
    let assignment = assign_groups(
        &vectors,
        fitted.vocabulary_size(),
        config,
        multi_progress,
    )
    .context("Density grouping failed")?;
    drop(vectors);
    log_clustering_stats(&assignment.stats);
    logger.log_completion(&format!("{} clusters", assignment.stats.clusters));
    stage_times.insert(PipelineStage::Clustering, logger.get_elapsed());

    // Partition
    let logger = StageLogger::new(PipelineStage::Partitioning);
    let partition = partition_rows(&assignment.labels);
    logger.log_completion(&format!(
        "{} grouped rows in {} groups, {} unique rows",
        partition.grouped.len(),
        partition.group_count,
        partition.unique.len()
    ));

    table.set_column(
        COMPOSITE_KEY_COLUMN,
        composite_keys.iter().cloned().map(CellValue::Text),
    );
    table.set_column(
        GROUP_COLUMN,
        assignment.labels.iter().copied().map(CellValue::Integer),
    );
    stage_times.insert(PipelineStage::Partitioning, logger.get_elapsed());

    Ok(ResolutionOutcome {
        table,
        composite_keys,
        group_ids: assignment.labels,
        partition,
        defaulted_columns: reconciled.defaulted_columns,
        empty_keys,
        encoder_stats,
        cluster_stats: assignment.stats,
        stage_times,
    })
}
