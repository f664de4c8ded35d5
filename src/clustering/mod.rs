pub mod density_clustering;
pub mod partition;

pub use density_clustering::{assign_groups, DensityClusterer, GroupAssignment};
pub use partition::{partition_rows, Partition};
