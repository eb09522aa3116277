//! # kmeans-oracle
//!
//! A reference k-means implementation, used as a correctness oracle for
//! faster or parallel clustering implementations: run both on the same
//! points and compare the resulting labels and centroids within a tolerance.
//!
//! ## Algorithm
//!
//! - **Initialization**: each of the `k` centroids is drawn uniformly inside
//!   the bounding box of the points, one coordinate at a time. The draw is
//!   random on purpose; a correct candidate implementation must reach a
//!   comparable clustering whatever the starting point.
//! - **Assignment**: every point takes the label of its nearest centroid
//!   (Euclidean distance, ties to the lowest index).
//! - **Update**: every centroid moves to the mean of its points. A centroid
//!   without points stays where it is.
//! - **Convergence**: the run stops once `max(old - new)` over all centroid
//!   coordinates is strictly below the threshold (`1e-4` by default), or
//!   after `max_iters` iterations.
//!
//! The convergence metric is signed, as in the reference tooling: a centroid
//! moving only towards larger coordinates passes the test however far it
//! moved. [`ShiftMetric::MaxAbs`] is available for callers that want the
//! absolute variant.
//!
//! ## Example
//!
//! ```rust
//! use kmeans_oracle::{ClusteringEngine, KMeansConfig};
//! use ndarray::array;
//!
//! let points = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
//!
//! let config = KMeansConfig::new(2).with_max_iters(10).with_seed(42);
//! let result = ClusteringEngine::with_config(config).fit(&points.view()).unwrap();
//!
//! assert_eq!(result.labels.len(), 4);
//! assert_eq!(result.centroids.nrows(), 2);
//! ```
//!
//! ## Comparing against another implementation
//!
//! ```rust
//! use kmeans_oracle::{compare::match_centroids, ClusteringEngine, KMeansConfig};
//! use ndarray::array;
//!
//! let points = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
//! let engine = ClusteringEngine::with_config(KMeansConfig::new(2).with_max_iters(10));
//! let reference = engine
//!     .fit_from_centroids(&points.view(), array![[1.0, 0.0], [9.0, 1.0]])
//!     .unwrap();
//!
//! // centroids produced elsewhere, numbered differently
//! let candidate = array![[10.0, 0.5], [0.0, 0.5]];
//! let matching = match_centroids(&reference.centroids.view(), &candidate.view()).unwrap();
//! assert_eq!(matching.permutation, vec![1, 0]);
//! assert!(matching.max_distance < 1e-9);
//! ```

mod algorithm;
pub mod compare;
mod config;
pub mod dataset;
mod distance;
mod error;
mod kmeans;
mod points;

pub use algorithm::{
    cluster_sizes, initialize_centroids, run, update_centroids, KMeansResult, Termination,
};
pub use config::{KMeansConfig, ShiftMetric};
pub use distance::{assign_labels, centroid_shift, euclidean_distance, nearest_centroid};
pub use error::{DatasetError, KMeansError};
pub use kmeans::{fit, ClusteringEngine};
pub use points::{bounding_box, points_from_rows, validate_points};
