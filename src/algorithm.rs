use crate::config::{KMeansConfig, ShiftMetric};
use crate::distance::{assign_labels, centroid_shift, euclidean_distance};
use crate::error::KMeansError;
use crate::points::{bounding_box, validate_points};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};
use rand::Rng;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How a run ended. Both outcomes are successful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The centroid shift dropped below the threshold
    Converged,
    /// `max_iters` iterations ran without passing the convergence test
    IterationCap,
}

/// Result of a clustering run
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Label of each input point, in input order
    pub labels: Array1<usize>,

    /// Final centroids, shape `(k, d)`
    pub centroids: Array2<f64>,

    /// Number of iterations executed (at least 1)
    pub n_iterations: usize,

    pub converged: bool,

    /// Shift measured on the last iteration
    pub shift: f64,
}

impl KMeansResult {
    pub fn termination(&self) -> Termination {
        if self.converged {
            Termination::Converged
        } else {
            Termination::IterationCap
        }
    }

    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }

    /// Number of points carrying each label
    pub fn cluster_sizes(&self) -> Vec<usize> {
        count_labels(&self.labels.view(), self.k())
    }

    /// Sum of squared distances from each point to its labelled centroid.
    ///
    /// Computed against the returned centroids, which on convergence are the
    /// successors of the positions the labels were assigned against.
    pub fn inertia(&self, points: &ArrayView2<f64>) -> f64 {
        points
            .outer_iter()
            .zip(self.labels.iter())
            .map(|(point, &label)| {
                let d = euclidean_distance(&point, &self.centroids.row(label));
                d * d
            })
            .sum()
    }
}

/// Check the run parameters against the point set
pub(crate) fn validate_inputs(
    points: &ArrayView2<f64>,
    k: usize,
    max_iters: usize,
) -> Result<(), KMeansError> {
    if k == 0 {
        return Err(KMeansError::invalid("k must be greater than 0"));
    }
    validate_points(points)?;
    if points.nrows() < k {
        return Err(KMeansError::invalid(format!(
            "number of points ({}) is less than k ({})",
            points.nrows(),
            k
        )));
    }
    if max_iters == 0 {
        return Err(KMeansError::invalid("max_iters must be at least 1"));
    }
    Ok(())
}

/// Draw `k` centroids uniformly inside the bounding box of `points`.
///
/// Coordinate `j` of every centroid is drawn independently from
/// `[min_j, max_j]`, centroid by centroid.
pub fn initialize_centroids<R: Rng>(points: &ArrayView2<f64>, k: usize, rng: &mut R) -> Array2<f64> {
    let (mins, maxs) = bounding_box(points);
    let n_features = points.ncols();

    let mut centroids = Array2::zeros((k, n_features));
    for mut centroid in centroids.outer_iter_mut() {
        for j in 0..n_features {
            centroid[j] = draw_between(rng, mins[j], maxs[j]);
        }
    }

    centroids
}

/// Uniform draw from `[lo, hi]`.
///
/// `gen_range` needs `hi - lo` to be finite. Wider ranges are sampled by
/// interpolating between the bounds instead.
fn draw_between<R: Rng>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if (hi - lo).is_finite() {
        rng.gen_range(lo..=hi)
    } else {
        let u: f64 = rng.gen_range(0.0..=1.0);
        (lo + u * hi - u * lo).max(lo).min(hi)
    }
}

fn check_labels(labels: &ArrayView1<usize>, k: usize) -> Result<(), KMeansError> {
    if let Some((i, &label)) = labels.indexed_iter().find(|(_, &l)| l >= k) {
        return Err(KMeansError::invalid(format!(
            "point {} has label {}, expected less than {}",
            i, label, k
        )));
    }
    Ok(())
}

fn count_labels(labels: &ArrayView1<usize>, k: usize) -> Vec<usize> {
    let mut counts = vec![0usize; k];
    for &label in labels.iter() {
        counts[label] += 1;
    }
    counts
}

/// Count the points carrying each label.
///
/// # Errors
///
/// Returns an error if any label is `>= k`.
pub fn cluster_sizes(labels: &ArrayView1<usize>, k: usize) -> Result<Vec<usize>, KMeansError> {
    check_labels(labels, k)?;
    Ok(count_labels(labels, k))
}

/// Recompute centroids as the mean of their members.
///
/// Uses one pass of running sums and counts. A centroid with no members
/// keeps its previous row unchanged. If a member sum overflows, that
/// centroid is recomputed with an incremental mean, which stays finite.
///
/// # Errors
///
/// Returns an error if there is not exactly one label per point, if a label
/// does not index a row of `previous`, or if points and centroids differ in
/// dimension.
pub fn update_centroids(
    points: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
    previous: &ArrayView2<f64>,
) -> Result<Array2<f64>, KMeansError> {
    let (k, n_features) = previous.dim();

    if labels.len() != points.nrows() {
        return Err(KMeansError::invalid(format!(
            "got {} labels for {} points",
            labels.len(),
            points.nrows()
        )));
    }
    if points.ncols() != n_features {
        return Err(KMeansError::invalid(format!(
            "points have {} dimensions, centroids have {}",
            points.ncols(),
            n_features
        )));
    }
    check_labels(labels, k)?;

    let mut cluster_sums: Array2<f64> = Array2::zeros((k, n_features));
    let mut cluster_counts = vec![0usize; k];

    for (point, &label) in points.outer_iter().zip(labels.iter()) {
        cluster_counts[label] += 1;
        let mut sum = cluster_sums.row_mut(label);
        sum += &point;
    }

    let mut centroids = previous.to_owned();
    for (cluster_idx, &count) in cluster_counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let sum = cluster_sums.row(cluster_idx);
        if sum.iter().all(|v| v.is_finite()) {
            centroids.row_mut(cluster_idx).assign(&(&sum / count as f64));
        } else {
            debug!(cluster = cluster_idx, "member sum overflowed, using incremental mean");
            let mean = incremental_mean(points, labels, cluster_idx);
            centroids.row_mut(cluster_idx).assign(&mean);
        }
    }

    Ok(centroids)
}

/// Mean of the points labelled `cluster`, updated one member at a time.
///
/// Every step adds `x / c - mean / c`, so no intermediate exceeds the
/// magnitude of the largest coordinate.
fn incremental_mean(
    points: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
    cluster: usize,
) -> Array1<f64> {
    let mut mean = Array1::zeros(points.ncols());
    let mut seen = 0usize;

    for (point, _) in points
        .outer_iter()
        .zip(labels.iter())
        .filter(|(_, &label)| label == cluster)
    {
        seen += 1;
        let c = seen as f64;
        Zip::from(&mut mean)
            .and(&point)
            .for_each(|m, &x| *m += x / c - *m / c);
    }

    mean
}

/// Run the assign/update loop from the given initial centroids.
///
/// Each iteration assigns labels against the current centroids, recomputes
/// the centroids and measures the shift between the two sets. The new
/// centroids are always adopted; the loop stops once the shift is strictly
/// below `config.tol` or after `config.max_iters` iterations.
pub fn run(
    points: &ArrayView2<f64>,
    initial_centroids: Array2<f64>,
    config: &KMeansConfig,
) -> Result<KMeansResult, KMeansError> {
    let k = initial_centroids.nrows();
    validate_inputs(points, k, config.max_iters)?;

    if initial_centroids.ncols() != points.ncols() {
        return Err(KMeansError::invalid(format!(
            "centroids have {} dimensions, points have {}",
            initial_centroids.ncols(),
            points.ncols()
        )));
    }
    if initial_centroids.iter().any(|v| !v.is_finite()) {
        return Err(KMeansError::invalid("initial centroids must be finite"));
    }

    debug!(
        n_points = points.nrows(),
        n_features = points.ncols(),
        k,
        max_iters = config.max_iters,
        "starting k-means"
    );

    let mut centroids = initial_centroids;
    let mut labels = Array1::zeros(points.nrows());
    let mut shift = f64::INFINITY;
    let mut n_iterations = 0;
    let mut converged = false;

    for iteration in 0..config.max_iters {
        let iter_start = Instant::now();
        n_iterations = iteration + 1;

        // Assignment must be complete before the update reads any label
        labels = assign_labels(points, &centroids.view(), config.parallel)?;

        let new_centroids = update_centroids(points, &labels.view(), &centroids.view())?;
        shift = centroid_shift(&centroids.view(), &new_centroids.view(), config.shift_metric)?;
        centroids = new_centroids;

        debug!(
            iteration = n_iterations,
            shift,
            elapsed_s = iter_start.elapsed().as_secs_f64(),
            "iteration done"
        );

        if shift < config.tol {
            converged = true;
            break;
        }
    }

    if converged {
        info!(iterations = n_iterations, shift, tol = config.tol, "converged");
        if config.shift_metric == ShiftMetric::SignedMax && shift < 0.0 {
            warn!(
                shift,
                "signed shift is negative; centroids may still be moving"
            );
        }
    } else {
        info!(
            iterations = n_iterations,
            shift,
            "iteration cap reached without convergence"
        );
    }

    let empty = count_labels(&labels.view(), k)
        .iter()
        .filter(|&&c| c == 0)
        .count();
    if empty > 0 {
        warn!(empty, k, "final clustering has empty clusters");
    }

    Ok(KMeansResult {
        labels,
        centroids,
        n_iterations,
        converged,
        shift,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config(max_iters: usize) -> KMeansConfig {
        KMeansConfig::new(2).with_max_iters(max_iters)
    }

    #[test]
    fn test_initialize_centroids_inside_bounding_box() {
        let data = Array2::random((100, 3), Uniform::new(-4.0, 7.0));
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let centroids = initialize_centroids(&data.view(), 5, &mut rng);
        let (mins, maxs) = bounding_box(&data.view());

        assert_eq!(centroids.dim(), (5, 3));
        for centroid in centroids.outer_iter() {
            for j in 0..3 {
                assert!(centroid[j] >= mins[j] && centroid[j] <= maxs[j]);
            }
        }
    }

    #[test]
    fn test_initialize_centroids_degenerate_dimension() {
        let data = array![[1.0, 2.0], [3.0, 2.0], [5.0, 2.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let centroids = initialize_centroids(&data.view(), 3, &mut rng);
        for centroid in centroids.outer_iter() {
            assert_eq!(centroid[1], 2.0);
        }
    }

    #[test]
    fn test_initialize_centroids_is_seeded() {
        let data = Array2::random((50, 2), Uniform::new(0.0, 1.0));

        let a = initialize_centroids(&data.view(), 4, &mut ChaCha8Rng::seed_from_u64(9));
        let b = initialize_centroids(&data.view(), 4, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_update_centroids_mean() {
        let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
        let labels = array![0, 0, 1, 1];
        let previous = array![[3.0, 3.0], [7.0, 7.0]];

        let centroids = update_centroids(&data.view(), &labels.view(), &previous.view()).unwrap();
        assert_abs_diff_eq!(centroids, array![[0.0, 0.5], [10.0, 0.5]], epsilon = 1e-12);
    }

    #[test]
    fn test_update_centroids_keeps_empty_cluster() {
        let data = array![[0.0, 0.0], [1.0, 1.0]];
        let labels = array![0, 0];
        let previous = array![[0.1, 0.2], [123.456, -7.891]];

        let centroids = update_centroids(&data.view(), &labels.view(), &previous.view()).unwrap();
        assert_eq!(centroids[[1, 0]].to_bits(), previous[[1, 0]].to_bits());
        assert_eq!(centroids[[1, 1]].to_bits(), previous[[1, 1]].to_bits());
        assert_abs_diff_eq!(centroids.row(0), array![0.5, 0.5], epsilon = 1e-12);
    }

    #[test]
    fn test_run_converges_on_separated_points() {
        let data = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
        let initial = array![[1.0, 0.2], [8.0, 0.7]];

        let result = run(&data.view(), initial, &config(10)).unwrap();

        assert!(result.converged);
        assert_eq!(result.termination(), Termination::Converged);
        assert_eq!(result.labels, array![0, 0, 1, 1]);
        assert_abs_diff_eq!(result.centroids, array![[0.0, 0.5], [10.0, 0.5]], epsilon = 1e-12);
        assert!(result.n_iterations <= 10);
    }

    #[test]
    fn test_run_returns_new_centroids_with_predecessor_labels() {
        // labels come from the initial centroids, centroids from the recomputed means
        let data = array![[0.0, 0.0], [4.0, 0.0], [10.0, 0.0]];
        let initial = array![[1.0, 0.0], [9.0, 0.0]];

        let result = run(&data.view(), initial, &config(1)).unwrap();

        assert_eq!(result.n_iterations, 1);
        assert_eq!(result.labels, array![0, 0, 1]);
        assert_abs_diff_eq!(result.centroids, array![[2.0, 0.0], [10.0, 0.0]], epsilon = 1e-12);
        // old - new = [-1, 0, -1, 0]
        assert!(result.converged);
        assert_abs_diff_eq!(result.shift, 0.0);
    }

    #[test]
    fn test_run_hits_iteration_cap() {
        let data = array![[0.0], [1.0], [10.0], [11.0]];
        let initial = array![[10.5], [11.0]];

        let result = run(&data.view(), initial, &config(1)).unwrap();

        // old - new = [10.5 - 11/3, 0] so the first check fails
        assert_eq!(result.termination(), Termination::IterationCap);
        assert_eq!(result.n_iterations, 1);
        assert_eq!(result.labels, array![0, 0, 0, 1]);
        assert_abs_diff_eq!(result.centroids, array![[11.0 / 3.0], [11.0]], epsilon = 1e-12);
    }

    #[test]
    fn test_run_rejects_mismatched_centroids() {
        let data = array![[0.0, 0.0], [1.0, 1.0]];
        let initial = array![[0.0, 0.0, 0.0]];

        let err = run(&data.view(), initial, &config(5)).unwrap_err();
        assert!(matches!(err, KMeansError::InvalidArgument(_)));
    }

    #[test]
    fn test_run_rejects_zero_iterations() {
        let data = array![[0.0, 0.0], [1.0, 1.0]];
        let initial = array![[0.0, 0.0]];

        assert!(run(&data.view(), initial, &config(0)).is_err());
    }

    #[test]
    fn test_inertia_and_cluster_sizes() {
        let data = array![[0.0, 0.0], [0.0, 2.0], [10.0, 0.0]];
        let result = KMeansResult {
            labels: array![0, 0, 1],
            centroids: array![[0.0, 1.0], [10.0, 0.0], [5.0, 5.0]],
            n_iterations: 1,
            converged: true,
            shift: 0.0,
        };

        assert_eq!(result.cluster_sizes(), vec![2, 1, 0]);
        assert_abs_diff_eq!(result.inertia(&data.view()), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_initialize_centroids_huge_range() {
        // max - min overflows f64 although both bounds are finite
        let data = array![[-1e308, 0.0], [1e308, 0.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let centroids = initialize_centroids(&data.view(), 2, &mut rng);
        for centroid in centroids.outer_iter() {
            assert!(centroid[0].is_finite());
            assert!((-1e308..=1e308).contains(&centroid[0]));
            assert_eq!(centroid[1], 0.0);
        }
    }

    #[test]
    fn test_run_with_huge_range() {
        let data = array![[-1e308, 0.0], [1e308, 0.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let initial = initialize_centroids(&data.view(), 2, &mut rng);

        let result = run(&data.view(), initial, &config(10)).unwrap();
        assert!(result.labels.iter().all(|&l| l < 2));
        assert!(result.centroids.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_update_centroids_sum_overflow() {
        let data = array![[1e308], [1.5e308]];
        let labels = array![0, 0];
        let previous = array![[1.2e308]];

        let centroids = update_centroids(&data.view(), &labels.view(), &previous.view()).unwrap();
        assert!(centroids[[0, 0]].is_finite());
        assert_relative_eq!(centroids[[0, 0]], 1.25e308, max_relative = 1e-12);
    }

    #[test]
    fn test_update_centroids_rejects_bad_labels() {
        let data = array![[0.0, 0.0], [1.0, 1.0], [10.0, 10.0]];
        let previous = array![[0.0, 0.0], [10.0, 10.0]];

        // one label short
        let labels = array![0, 1];
        let err = update_centroids(&data.view(), &labels.view(), &previous.view()).unwrap_err();
        assert!(matches!(err, KMeansError::InvalidArgument(_)));

        // label past the last centroid
        let labels = array![0, 1, 5];
        assert!(update_centroids(&data.view(), &labels.view(), &previous.view()).is_err());

        // centroids of the wrong dimension
        let labels = array![0, 1, 1];
        let wide = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        assert!(update_centroids(&data.view(), &labels.view(), &wide.view()).is_err());
    }

    #[test]
    fn test_cluster_sizes() {
        let labels = array![0, 2, 2, 0, 2];

        assert_eq!(cluster_sizes(&labels.view(), 4).unwrap(), vec![2, 0, 3, 0]);
        assert!(cluster_sizes(&labels.view(), 2).is_err());
    }
}
