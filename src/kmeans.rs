use crate::algorithm::{initialize_centroids, run, validate_inputs, KMeansResult};
use crate::config::KMeansConfig;
use crate::distance::assign_labels;
use crate::error::KMeansError;
use crate::points::validate_points;
use ndarray::{Array1, Array2, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Reference k-means engine.
///
/// The engine only holds its configuration. Every call to [`fit`] owns its
/// centroid set from initialization to return, so one engine can serve
/// concurrent fits.
///
/// # Example
///
/// ```
/// use kmeans_oracle::{ClusteringEngine, KMeansConfig};
/// use ndarray::array;
///
/// let points = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
/// let engine = ClusteringEngine::with_config(KMeansConfig::new(2).with_max_iters(10));
///
/// let result = engine
///     .fit_from_centroids(&points.view(), array![[1.0, 0.0], [9.0, 1.0]])
///     .unwrap();
/// assert_eq!(result.labels.to_vec(), vec![0, 0, 1, 1]);
/// ```
///
/// [`fit`]: ClusteringEngine::fit
#[derive(Debug, Clone)]
pub struct ClusteringEngine {
    config: KMeansConfig,
}

impl ClusteringEngine {
    /// Create an engine for `k` clusters with the default configuration.
    ///
    /// The default iteration cap is 1; raise it with
    /// [`KMeansConfig::with_max_iters`] to let runs converge.
    pub fn new(k: usize) -> Self {
        Self {
            config: KMeansConfig::new(k),
        }
    }

    pub fn with_config(config: KMeansConfig) -> Self {
        Self { config }
    }

    /// Cluster `points` starting from centroids drawn uniformly in their
    /// bounding box.
    ///
    /// The draw is seeded from `config.seed`, or from OS entropy when unset.
    ///
    /// # Errors
    ///
    /// Returns [`KMeansError::InvalidArgument`] if `k` is 0 or larger than the
    /// number of points, if `points` is empty or holds non-finite values, or
    /// if `max_iters` is 0. No centroid is drawn in that case.
    pub fn fit(&self, points: &ArrayView2<f64>) -> Result<KMeansResult, KMeansError> {
        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.fit_with_rng(points, &mut rng)
    }

    /// Like [`fit`](ClusteringEngine::fit), drawing initial centroids from
    /// the caller's random source.
    pub fn fit_with_rng<R: Rng>(
        &self,
        points: &ArrayView2<f64>,
        rng: &mut R,
    ) -> Result<KMeansResult, KMeansError> {
        validate_inputs(points, self.config.k, self.config.max_iters)?;

        let centroids = initialize_centroids(points, self.config.k, rng);
        run(points, centroids, &self.config)
    }

    /// Cluster `points` starting from the given centroids.
    ///
    /// `initial` must have shape `(k, d)`, where `k` is the configured cluster
    /// count and `d` the point dimension.
    pub fn fit_from_centroids(
        &self,
        points: &ArrayView2<f64>,
        initial: Array2<f64>,
    ) -> Result<KMeansResult, KMeansError> {
        if initial.nrows() != self.config.k {
            return Err(KMeansError::invalid(format!(
                "expected {} initial centroids, got {}",
                self.config.k,
                initial.nrows()
            )));
        }
        run(points, initial, &self.config)
    }

    /// Label `points` by their nearest centroid in `centroids`.
    ///
    /// # Errors
    ///
    /// Returns an error if either set is empty or invalid, or if their
    /// dimensions differ.
    pub fn predict(
        &self,
        points: &ArrayView2<f64>,
        centroids: &ArrayView2<f64>,
    ) -> Result<Array1<usize>, KMeansError> {
        validate_points(points)?;
        validate_points(centroids)?;

        if points.ncols() != centroids.ncols() {
            return Err(KMeansError::invalid(format!(
                "expected {} features, got {}",
                centroids.ncols(),
                points.ncols()
            )));
        }

        assign_labels(points, centroids, self.config.parallel)
    }

    /// Get the number of clusters.
    pub fn k(&self) -> usize {
        self.config.k
    }

    /// Get the configuration.
    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }
}

/// Cluster `points` into `k` groups, iterating at most `max_iters` times.
///
/// Initialization is unseeded. Use [`ClusteringEngine`] with
/// [`KMeansConfig::with_seed`] for reproducible runs.
pub fn fit(
    points: &ArrayView2<f64>,
    k: usize,
    max_iters: usize,
) -> Result<KMeansResult, KMeansError> {
    ClusteringEngine::with_config(KMeansConfig::new(k).with_max_iters(max_iters)).fit(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    #[test]
    fn test_engine_new() {
        let engine = ClusteringEngine::new(10);
        assert_eq!(engine.k(), 10);
        assert_eq!(engine.config().max_iters, 1);
    }

    #[test]
    fn test_engine_fit() {
        let data = Array2::random((500, 32), Uniform::new(-1.0, 1.0));
        let engine = ClusteringEngine::with_config(KMeansConfig::new(5).with_max_iters(20).with_seed(3));

        let result = engine.fit(&data.view()).unwrap();

        assert_eq!(result.centroids.dim(), (5, 32));
        assert_eq!(result.labels.len(), 500);
        assert!(result.labels.iter().all(|&l| l < 5));
        assert!(result.n_iterations >= 1 && result.n_iterations <= 20);
    }

    #[test]
    fn test_engine_fit_with_seed_is_reproducible() {
        let data = Array2::random((200, 4), Uniform::new(-1.0, 1.0));
        let engine = ClusteringEngine::with_config(KMeansConfig::new(4).with_max_iters(50).with_seed(11));

        let a = engine.fit(&data.view()).unwrap();
        let b = engine.fit(&data.view()).unwrap();

        assert_eq!(a.labels, b.labels);
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.n_iterations, b.n_iterations);
    }

    #[test]
    fn test_engine_fit_from_centroids_wrong_k() {
        let data = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        let engine = ClusteringEngine::new(2);

        let err = engine
            .fit_from_centroids(&data.view(), array![[0.0, 0.0]])
            .unwrap_err();
        assert!(matches!(err, KMeansError::InvalidArgument(_)));
    }

    #[test]
    fn test_engine_predict() {
        let engine = ClusteringEngine::new(2);
        let centroids = array![[0.0, 0.0], [10.0, 10.0]];
        let data = array![[1.0, 1.0], [9.0, 8.0], [-3.0, 0.5]];

        let labels = engine.predict(&data.view(), &centroids.view()).unwrap();
        assert_eq!(labels, array![0, 1, 0]);
    }

    #[test]
    fn test_engine_dimension_mismatch() {
        let engine = ClusteringEngine::new(2);
        let centroids = array![[0.0, 0.0], [10.0, 10.0]];
        let data = array![[1.0, 1.0, 1.0]];

        let result = engine.predict(&data.view(), &centroids.view());
        assert!(matches!(result, Err(KMeansError::InvalidArgument(_))));
    }

    #[test]
    fn test_engine_k_zero() {
        let data = array![[0.0, 0.0], [1.0, 1.0]];
        let result = ClusteringEngine::new(0).fit(&data.view());
        assert!(matches!(result, Err(KMeansError::InvalidArgument(_))));
    }

    #[test]
    fn test_free_fit() {
        let data = array![[0.0], [0.5], [1.0]];
        let result = fit(&data.view(), 1, 5).unwrap();

        assert_eq!(result.labels, array![0, 0, 0]);
        assert!((result.centroids[[0, 0]] - 0.5).abs() < 1e-12);
    }
}
