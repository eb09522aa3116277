//! Comparison of two clusterings of the same point set.
//!
//! Cluster indices are arbitrary, so two runs that found the same clusters
//! can number them differently. Centroids are first paired up, then labels
//! are compared through that pairing.

use crate::algorithm::KMeansResult;
use crate::distance::euclidean_distance;
use crate::error::KMeansError;
use ndarray::{ArrayView1, ArrayView2};

/// Pairing between the centroids of a reference and a candidate run
#[derive(Debug, Clone, PartialEq)]
pub struct CentroidMatching {
    /// `permutation[r]` is the candidate centroid paired with reference
    /// centroid `r`
    pub permutation: Vec<usize>,

    /// Largest Euclidean distance between two paired centroids
    pub max_distance: f64,
}

impl CentroidMatching {
    /// Map a candidate cluster index back to the reference index
    pub fn inverse(&self) -> Vec<usize> {
        let mut inverse = vec![0; self.permutation.len()];
        for (r, &c) in self.permutation.iter().enumerate() {
            inverse[c] = r;
        }
        inverse
    }
}

/// Outcome of [`compare_runs`]
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub matching: CentroidMatching,

    /// Fraction of points whose labels agree once remapped, in `[0, 1]`
    pub label_agreement: f64,

    /// Every paired centroid is within the tolerance and every label agrees
    pub within_tolerance: bool,
}

/// Pair each reference centroid with a candidate centroid.
///
/// Greedy: the globally closest unpaired couple is taken first. Ties are
/// broken by reference index, then candidate index.
pub fn match_centroids(
    reference: &ArrayView2<f64>,
    candidate: &ArrayView2<f64>,
) -> Result<CentroidMatching, KMeansError> {
    if reference.dim() != candidate.dim() {
        return Err(KMeansError::invalid(format!(
            "centroid sets differ in shape: {:?} vs {:?}",
            reference.dim(),
            candidate.dim()
        )));
    }

    let k = reference.nrows();
    let mut pairs = Vec::with_capacity(k * k);
    for (r, ref_c) in reference.outer_iter().enumerate() {
        for (c, cand_c) in candidate.outer_iter().enumerate() {
            pairs.push((euclidean_distance(&ref_c, &cand_c), r, c));
        }
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut permutation = vec![usize::MAX; k];
    let mut taken = vec![false; k];
    let mut max_distance = 0.0f64;
    let mut remaining = k;

    for (dist, r, c) in pairs {
        if remaining == 0 {
            break;
        }
        if permutation[r] != usize::MAX || taken[c] {
            continue;
        }
        permutation[r] = c;
        taken[c] = true;
        max_distance = max_distance.max(dist);
        remaining -= 1;
    }

    Ok(CentroidMatching {
        permutation,
        max_distance,
    })
}

/// Fraction of points whose candidate label, mapped through `matching`,
/// equals the reference label.
pub fn label_agreement(
    reference: &ArrayView1<usize>,
    candidate: &ArrayView1<usize>,
    matching: &CentroidMatching,
) -> Result<f64, KMeansError> {
    if reference.len() != candidate.len() {
        return Err(KMeansError::invalid(format!(
            "label arrays differ in length: {} vs {}",
            reference.len(),
            candidate.len()
        )));
    }
    if reference.is_empty() {
        return Err(KMeansError::invalid("label arrays are empty"));
    }

    let k = matching.permutation.len();
    let inverse = matching.inverse();
    let mut agree = 0usize;

    for (&r, &c) in reference.iter().zip(candidate.iter()) {
        if r >= k || c >= k {
            return Err(KMeansError::invalid(format!(
                "label out of range for {} clusters",
                k
            )));
        }
        if inverse[c] == r {
            agree += 1;
        }
    }

    Ok(agree as f64 / reference.len() as f64)
}

/// Compare a candidate run against a reference run on the same points.
///
/// The candidate passes when every paired centroid lies within `tol` of its
/// reference centroid and all labels agree.
pub fn compare_runs(
    reference: &KMeansResult,
    candidate: &KMeansResult,
    tol: f64,
) -> Result<Comparison, KMeansError> {
    let matching = match_centroids(&reference.centroids.view(), &candidate.centroids.view())?;
    let agreement = label_agreement(&reference.labels.view(), &candidate.labels.view(), &matching)?;
    let within_tolerance = matching.max_distance <= tol && agreement == 1.0;

    Ok(Comparison {
        matching,
        label_agreement: agreement,
        within_tolerance,
    })
}
