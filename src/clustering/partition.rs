// src/clustering/partition.rs

use std::collections::HashSet;

use crate::utils::constants::NOISE_GROUP;

/// Row positions split into grouped and unique views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Rows with a group id, ordered by group id then original position.
    pub grouped: Vec<usize>,
    /// Rows without a group id, in original order.
    pub unique: Vec<usize>,
    /// Number of distinct group ids present.
    pub group_count: usize,
}

impl Partition {
    pub fn total_rows(&self) -> usize {
        self.grouped.len() + self.unique.len()
    }
}

pub fn partition_rows(labels: &[i64]) -> Partition {
    let mut grouped: Vec<usize> = Vec::new();
    let mut unique = Vec::new();
    let mut group_ids = HashSet::new();

    for (row, &label) in labels.iter().enumerate() {
        if label == NOISE_GROUP {
            unique.push(row);
        } else {
            grouped.push(row);
            group_ids.insert(label);
        }
    }

    // Stable sort keeps original order within each group.
    grouped.sort_by_key(|&row| labels[row]);

    Partition {
        grouped,
        unique,
        group_count: group_ids.len(),
    }
}
