/// How the per-iteration centroid movement is reduced to a single scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftMetric {
    /// `max(old - new)` over every coordinate of every centroid.
    ///
    /// This is signed: a centroid that only moves towards larger coordinates
    /// yields a negative shift and passes the convergence test however far it
    /// moved. Kept as the default so results match the reference oracle.
    #[default]
    SignedMax,

    /// `max(|old - new|)` over every coordinate of every centroid.
    MaxAbs,
}

/// Configuration for the clustering engine
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters
    pub k: usize,

    /// Maximum number of iterations. Runs that hit this cap return their last
    /// labels and centroids as a best effort.
    pub max_iters: usize,

    /// Convergence threshold. The run stops as soon as the centroid shift is
    /// strictly below this value.
    pub tol: f64,

    /// Reduction used for the convergence test
    pub shift_metric: ShiftMetric,

    /// Seed for centroid initialization. `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,

    /// Fan the assignment step out over the rayon thread pool
    pub parallel: bool,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            max_iters: 1,
            tol: 1e-4,
            shift_metric: ShiftMetric::SignedMax,
            seed: None,
            parallel: true,
        }
    }
}

impl KMeansConfig {
    /// Create a new configuration with the specified number of clusters
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    /// Set the maximum number of iterations
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the convergence threshold
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the shift reduction used by the convergence test
    pub fn with_shift_metric(mut self, metric: ShiftMetric) -> Self {
        self.shift_metric = metric;
        self
    }

    /// Pin the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run the assignment step on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
