// src/clustering/density_clustering.rs - Density-based grouping of encoded rows

use anyhow::{bail, Result};
use indicatif::MultiProgress;
use log::{debug, info};
use ndarray::Array1;
use std::borrow::Borrow;
use std::collections::HashMap;

// petgraph imports
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;

use crate::matching::tfidf::SparseVector;
use crate::models::stats_models::ClusteringStats;
use crate::utils::constants::NOISE_GROUP;
use crate::utils::progress_bars::progress_config::stage_progress_bar;
use crate::utils::resolution_config::ResolutionConfig;

/// DBSCAN over cosine distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityClusterer {
    eps: f64,
    min_samples: usize,
}

/// Labels for one clustering pass plus what the pass found.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAssignment {
    /// One label per input row; `NOISE_GROUP` for rows in no group.
    pub labels: Vec<i64>,
    pub stats: ClusteringStats,
}

impl DensityClusterer {
    pub fn new(eps: f64, min_samples: usize) -> Result<Self> {
        if !eps.is_finite() || eps < 0.0 {
            bail!("eps must be a finite, non-negative cosine distance (got {})", eps);
        }
        if min_samples == 0 {
            bail!("min_samples must be at least 1");
        }
        Ok(Self { eps, min_samples })
    }

    pub fn from_config(config: &ResolutionConfig) -> Result<Self> {
        Self::new(config.eps, config.min_samples)
    }

    /// Clusters `points`. Clusters are numbered in order of their lowest-index
    /// core point; a border point reachable from several clusters joins the
    /// lowest-numbered one. Unreachable points get `NOISE_GROUP`.
    pub fn fit_predict<V: Borrow<SparseVector>>(
        &self,
        points: &[V],
        multi_progress: Option<&MultiProgress>,
    ) -> GroupAssignment {
        let n_points = points.len();
        if n_points == 0 {
            return GroupAssignment {
                labels: Vec::new(),
                stats: ClusteringStats::default(),
            };
        }

        let neighborhoods = self.neighborhoods(points, multi_progress);
        let is_core: Vec<bool> = neighborhoods
            .iter()
            .map(|n| n.len() >= self.min_samples)
            .collect();

        let core_graph = build_core_graph(&neighborhoods, &is_core);
        debug!(
            "Core graph: {} nodes, {} edges, {} components",
            core_graph.node_count(),
            core_graph.edge_count(),
            connected_components(&core_graph)
        );

        let mut labels = vec![NOISE_GROUP; n_points];
        let mut next_label: i64 = 0;
        for start in 0..n_points {
            if !is_core[start] || labels[start] != NOISE_GROUP {
                continue;
            }
            let mut bfs = Bfs::new(&core_graph, NodeIndex::new(start));
            while let Some(node) = bfs.next(&core_graph) {
                labels[node.index()] = next_label;
            }
            next_label += 1;
        }

        // Border points join the earliest cluster owning one of their core neighbours.
        for i in 0..n_points {
            if is_core[i] {
                continue;
            }
            labels[i] = neighborhoods[i]
                .iter()
                .filter(|&&j| is_core[j])
                .map(|&j| labels[j])
                .min()
                .unwrap_or(NOISE_GROUP);
        }

        let stats = summarize(&labels, &is_core, next_label as usize);
        GroupAssignment { labels, stats }
    }

    /// Indices within `eps` cosine distance of each point, itself included,
    /// in increasing order. Similarities are accumulated through an inverted
    /// index over the features, one query row at a time, so only pairs that
    /// share a feature are ever scored. Vectors are read in place and scaled
    /// by their norms on the fly.
    fn neighborhoods<V: Borrow<SparseVector>>(
        &self,
        points: &[V],
        multi_progress: Option<&MultiProgress>,
    ) -> Vec<Vec<usize>> {
        let n_points = points.len();
        let pb = stage_progress_bar(multi_progress, n_points as u64, "Querying neighbourhoods...");

        // Rows sharing no feature sit at distance 1, so a radius of 1 or more
        // must look at every row.
        let scan_all = self.eps >= 1.0;
        let norms: Vec<f64> = points.iter().map(|p| p.borrow().norm()).collect();
        let postings = build_postings(points, &norms);
        let mut scores = Array1::<f64>::zeros(n_points);
        let mut seen = vec![false; n_points];
        let mut touched: Vec<usize> = Vec::new();

        let mut neighborhoods = Vec::with_capacity(n_points);
        for (i, query) in points.iter().enumerate() {
            let query = query.borrow();
            let mut neighbors: Vec<usize> = if scan_all {
                (0..n_points)
                    .filter(|&j| {
                        j == i
                            || cosine_distance_from_similarity(cosine_similarity(
                                query,
                                points[j].borrow(),
                                norms[i] * norms[j],
                            )) <= self.eps
                    })
                    .collect()
            } else if norms[i] == 0.0 {
                vec![i]
            } else {
                for (&feature, &value) in query.indices.iter().zip(&query.values) {
                    let weight = value / norms[i];
                    if let Some(posting) = postings.get(&feature) {
                        for &(j, other) in posting {
                            if !seen[j] {
                                seen[j] = true;
                                touched.push(j);
                            }
                            scores[j] += weight * other;
                        }
                    }
                }
                let mut found: Vec<usize> = touched
                    .iter()
                    .copied()
                    .filter(|&j| j != i && cosine_distance_from_similarity(scores[j]) <= self.eps)
                    .collect();
                found.push(i);
                for &j in &touched {
                    scores[j] = 0.0;
                    seen[j] = false;
                }
                touched.clear();
                found
            };
            neighbors.sort_unstable();
            neighborhoods.push(neighbors);

            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = &pb {
            pb.finish_with_message("Neighbourhoods computed");
        }
        neighborhoods
    }
}

/// Feature index to the rows carrying it, with their unit-scaled weights.
fn build_postings<V: Borrow<SparseVector>>(
    vectors: &[V],
    norms: &[f64],
) -> HashMap<usize, Vec<(usize, f64)>> {
    let mut postings: HashMap<usize, Vec<(usize, f64)>> = HashMap::new();
    for (row, vector) in vectors.iter().enumerate() {
        if norms[row] == 0.0 {
            continue;
        }
        let vector = vector.borrow();
        for (&feature, &value) in vector.indices.iter().zip(&vector.values) {
            if value != 0.0 {
                postings
                    .entry(feature)
                    .or_default()
                    .push((row, value / norms[row]));
            }
        }
    }
    postings
}

fn cosine_similarity(a: &SparseVector, b: &SparseVector, norm_product: f64) -> f64 {
    if norm_product == 0.0 {
        0.0
    } else {
        a.dot(b) / norm_product
    }
}

/// Cosine distance clipped to `[0, 2]`, absorbing rounding on unit vectors.
fn cosine_distance_from_similarity(similarity: f64) -> f64 {
    (1.0 - similarity).clamp(0.0, 2.0)
}

/// One node per point; edges join core points that are neighbours.
fn build_core_graph(neighborhoods: &[Vec<usize>], is_core: &[bool]) -> UnGraph<usize, ()> {
    let mut graph = UnGraph::with_capacity(neighborhoods.len(), 0);
    for i in 0..neighborhoods.len() {
        graph.add_node(i);
    }
    for (i, neighbors) in neighborhoods.iter().enumerate() {
        if !is_core[i] {
            continue;
        }
        for &j in neighbors {
            if j > i && is_core[j] {
                graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
            }
        }
    }
    graph
}

fn summarize(labels: &[i64], is_core: &[bool], clusters: usize) -> ClusteringStats {
    let mut sizes: HashMap<i64, usize> = HashMap::new();
    let mut core_points = 0;
    let mut border_points = 0;
    let mut noise_points = 0;

    for (&label, &core) in labels.iter().zip(is_core) {
        if label == NOISE_GROUP {
            noise_points += 1;
            continue;
        }
        *sizes.entry(label).or_insert(0) += 1;
        if core {
            core_points += 1;
        } else {
            border_points += 1;
        }
    }

    ClusteringStats {
        points_clustered: labels.len(),
        core_points,
        border_points,
        noise_points,
        clusters,
        largest_cluster: sizes.values().copied().max().unwrap_or(0),
        skipped: false,
    }
}

/// Assigns a group id to every encoded row. Only rows with a non-zero vector
/// are clustered; their labels are scattered back by position and every
/// other row keeps `NOISE_GROUP`.
pub fn assign_groups(
    vectors: &[SparseVector],
    n_features: usize,
    config: &ResolutionConfig,
    multi_progress: Option<&MultiProgress>,
) -> Result<GroupAssignment> {
    let clusterer = DensityClusterer::from_config(config)?;
    let mut labels = vec![NOISE_GROUP; vectors.len()];

    let nonzero_rows: Vec<usize> = vectors
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_zero())
        .map(|(i, _)| i)
        .collect();

    if nonzero_rows.is_empty() {
        info!("No rows with usable keys; skipping clustering");
        return Ok(GroupAssignment {
            labels,
            stats: ClusteringStats {
                skipped: true,
                ..ClusteringStats::default()
            },
        });
    }

    let subset = select_vectors(vectors, &nonzero_rows, n_features)?;
    info!(
        "Clustering {} of {} rows ({} features)",
        nonzero_rows.len(),
        vectors.len(),
        n_features
    );

    let assignment = clusterer.fit_predict(&subset, multi_progress);
    for (&row, &label) in nonzero_rows.iter().zip(&assignment.labels) {
        labels[row] = label;
    }

    Ok(GroupAssignment {
        labels,
        stats: assignment.stats,
    })
}

fn select_vectors<'a>(
    vectors: &'a [SparseVector],
    rows: &[usize],
    n_features: usize,
) -> Result<Vec<&'a SparseVector>> {
    let mut subset = Vec::with_capacity(rows.len());
    for &row in rows {
        let vector = &vectors[row];
        if let Some(&max_index) = vector.indices.last() {
            if max_index >= n_features {
                bail!(
                    "Row {} references feature {} outside the {}-feature space",
                    row,
                    max_index,
                    n_features
                );
            }
        }
        subset.push(vector);
    }
    Ok(subset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn clusterer(eps: f64, min_samples: usize) -> DensityClusterer {
        DensityClusterer::new(eps, min_samples).unwrap()
    }

    fn sparse_rows(points: &Array2<f64>) -> Vec<SparseVector> {
        points
            .rows()
            .into_iter()
            .map(|row| {
                let mut vector = SparseVector::default();
                for (idx, &value) in row.iter().enumerate() {
                    if value != 0.0 {
                        vector.indices.push(idx);
                        vector.values.push(value);
                    }
                }
                vector
            })
            .collect()
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(DensityClusterer::new(-0.5, 3).is_err());
        assert!(DensityClusterer::new(f64::INFINITY, 3).is_err());
        assert!(DensityClusterer::new(0.2, 0).is_err());
    }

    #[test]
    fn test_dense_group_and_noise() {
        let points = array![
            [1.0, 0.0, 0.0],
            [0.99, 0.05, 0.0],
            [0.98, 0.0, 0.05],
            [0.0, 1.0, 0.0],
        ];
        let result = clusterer(0.2, 3).fit_predict(&sparse_rows(&points), None);
        assert_eq!(result.labels, vec![0, 0, 0, NOISE_GROUP]);
        assert_eq!(result.stats.clusters, 1);
        assert_eq!(result.stats.core_points, 3);
        assert_eq!(result.stats.noise_points, 1);
        assert_eq!(result.stats.largest_cluster, 3);
    }

    #[test]
    fn test_fewer_points_than_min_samples_is_all_noise() {
        let points = array![[1.0, 0.0], [1.0, 0.0]];
        let result = clusterer(0.2, 3).fit_predict(&sparse_rows(&points), None);
        assert_eq!(result.labels, vec![NOISE_GROUP, NOISE_GROUP]);
        assert_eq!(result.stats.clusters, 0);
    }

    #[test]
    fn test_labels_follow_first_core_point() {
        let points = array![
            [0.0, 1.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
        ];
        let result = clusterer(0.1, 2).fit_predict(&sparse_rows(&points), None);
        assert_eq!(result.labels, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_border_point_joins_cluster_without_being_core() {
        // Point 3 sits at ~0.134 cosine distance from the core trio's edge
        // member only, so it is a border point with a neighbourhood of two.
        let angle = |deg: f64| [deg.to_radians().cos(), deg.to_radians().sin()];
        let p = [angle(0.0), angle(5.0), angle(10.0), angle(40.0)];
        let points = Array2::from_shape_vec((4, 2), p.iter().flatten().copied().collect()).unwrap();

        let result = clusterer(0.14, 3).fit_predict(&sparse_rows(&points), None);
        assert_eq!(result.labels, vec![0, 0, 0, 0]);
        assert_eq!(result.stats.core_points, 3);
        assert_eq!(result.stats.border_points, 1);
    }

    #[test]
    fn test_chained_core_points_merge() {
        let angle = |deg: f64| [deg.to_radians().cos(), deg.to_radians().sin()];
        let p = [angle(0.0), angle(15.0), angle(30.0), angle(45.0), angle(60.0)];
        let points = Array2::from_shape_vec((5, 2), p.iter().flatten().copied().collect()).unwrap();

        // Neighbours are only 15 degrees apart (~0.034), ends are 60 apart (0.5).
        let result = clusterer(0.05, 2).fit_predict(&sparse_rows(&points), None);
        assert_eq!(result.labels, vec![0, 0, 0, 0, 0]);
        assert_eq!(result.stats.clusters, 1);
    }

    #[test]
    fn test_vector_length_does_not_affect_distance() {
        let points = array![[1.0, 0.0], [5.0, 0.0], [0.2, 0.0], [0.0, 4.0]];
        let result = clusterer(0.01, 3).fit_predict(&sparse_rows(&points), None);
        assert_eq!(result.labels, vec![0, 0, 0, NOISE_GROUP]);

        // At eps 1 orthogonal rows become neighbours too.
        let result = clusterer(1.0, 4).fit_predict(&sparse_rows(&points), None);
        assert_eq!(result.labels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_fit_predict_accepts_borrowed_rows() {
        let owned = sparse_rows(&array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let borrowed: Vec<&SparseVector> = owned.iter().collect();
        let by_ref = clusterer(0.1, 2).fit_predict(&borrowed, None);
        let by_value = clusterer(0.1, 2).fit_predict(&owned, None);
        assert_eq!(by_ref, by_value);
        assert_eq!(by_ref.labels, vec![0, 0, NOISE_GROUP]);
    }

    #[test]
    fn test_assign_groups_skips_zero_vectors() {
        let unit = |idx: usize| SparseVector {
            indices: vec![idx],
            values: vec![1.0],
        };
        let vectors = vec![unit(0), SparseVector::default(), unit(0), unit(0), unit(1)];
        let config = ResolutionConfig::default();
        let result = assign_groups(&vectors, 2, &config, None).unwrap();
        assert_eq!(result.labels, vec![0, NOISE_GROUP, 0, 0, NOISE_GROUP]);
        assert_eq!(result.stats.points_clustered, 4);
        assert!(!result.stats.skipped);
    }

    #[test]
    fn test_assign_groups_all_zero_skips_clustering() {
        let vectors = vec![SparseVector::default(); 3];
        let result = assign_groups(&vectors, 0, &ResolutionConfig::default(), None).unwrap();
        assert_eq!(result.labels, vec![NOISE_GROUP; 3]);
        assert!(result.stats.skipped);
    }

    #[test]
    fn test_assign_groups_rejects_out_of_range_features() {
        let vectors = vec![SparseVector {
            indices: vec![5],
            values: vec![1.0],
        }];
        assert!(assign_groups(&vectors, 2, &ResolutionConfig::default(), None).is_err());
    }
}
