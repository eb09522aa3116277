use crate::config::ShiftMetric;
use crate::error::KMeansError;
use ndarray::{Array1, ArrayView1, ArrayView2, Zip};
use rayon::prelude::*;

/// Euclidean distance between two points of equal dimension.
///
/// Panics if the dimensions differ.
#[inline]
pub fn euclidean_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    Zip::from(a)
        .and(b)
        .fold(0.0f64, |acc, &x, &y| acc + (x - y) * (x - y))
        .sqrt()
}

/// Find the centroid closest to `point`.
///
/// Scans centroids left to right and only replaces the current best on a
/// strictly smaller distance, so exact ties resolve to the lowest index.
///
/// # Returns
/// * `(index, distance)` of the nearest centroid, or `(0, inf)` when there
///   are no centroids
///
/// Panics if `point` and the centroids differ in dimension.
pub fn nearest_centroid(point: &ArrayView1<f64>, centroids: &ArrayView2<f64>) -> (usize, f64) {
    let mut best_label = 0;
    let mut best_dist = f64::INFINITY;

    for (j, centroid) in centroids.outer_iter().enumerate() {
        let dist = euclidean_distance(point, &centroid);
        if dist < best_dist {
            best_dist = dist;
            best_label = j;
        }
    }

    (best_label, best_dist)
}

/// Assign every point to its nearest centroid.
///
/// The parallel path splits points across the rayon pool; each label only
/// depends on its own point, so both paths return identical labels.
///
/// # Errors
///
/// Returns an error if there are no centroids or if points and centroids
/// differ in dimension.
pub fn assign_labels(
    points: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    parallel: bool,
) -> Result<Array1<usize>, KMeansError> {
    if centroids.nrows() == 0 {
        return Err(KMeansError::invalid("no centroids to assign points to"));
    }
    if points.ncols() != centroids.ncols() {
        return Err(KMeansError::invalid(format!(
            "points have {} dimensions, centroids have {}",
            points.ncols(),
            centroids.ncols()
        )));
    }

    let n_points = points.nrows();

    let labels = if parallel {
        let labels: Vec<usize> = (0..n_points)
            .into_par_iter()
            .map(|i| nearest_centroid(&points.row(i), centroids).0)
            .collect();
        Array1::from_vec(labels)
    } else {
        points
            .outer_iter()
            .map(|point| nearest_centroid(&point, centroids).0)
            .collect()
    };

    Ok(labels)
}

/// Reduce the movement between two centroid sets to a single scalar.
///
/// Both sets must have the same `(k, d)` shape.
pub fn centroid_shift(
    old_centroids: &ArrayView2<f64>,
    new_centroids: &ArrayView2<f64>,
    metric: ShiftMetric,
) -> Result<f64, KMeansError> {
    if old_centroids.dim() != new_centroids.dim() {
        return Err(KMeansError::invalid(format!(
            "cannot measure shift between {:?} and {:?} centroids",
            old_centroids.dim(),
            new_centroids.dim()
        )));
    }

    let zip = Zip::from(old_centroids).and(new_centroids);

    let shift = match metric {
        ShiftMetric::SignedMax => zip.fold(f64::NEG_INFINITY, |acc, &o, &n| acc.max(o - n)),
        ShiftMetric::MaxAbs => zip.fold(0.0f64, |acc, &o, &n| acc.max((o - n).abs())),
    };
    Ok(shift)
}
