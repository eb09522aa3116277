//! Point set construction and validation.
//!
//! A point set is an `n x d` array: row `i` is point `i`, and labels returned
//! by the engine are aligned with row order.

use crate::error::KMeansError;
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Build a point set from row vectors.
///
/// Fails if there are no rows, if the first row is empty, or if any row's
/// length differs from the first row's.
pub fn points_from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>, KMeansError> {
    let first = rows
        .first()
        .ok_or_else(|| KMeansError::invalid("point set is empty"))?;
    let d = first.len();

    if d == 0 {
        return Err(KMeansError::invalid("points must have at least one dimension"));
    }

    let mut flat = Vec::with_capacity(rows.len() * d);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != d {
            return Err(KMeansError::invalid(format!(
                "point {} has {} dimensions, expected {}",
                i,
                row.len(),
                d
            )));
        }
        flat.extend_from_slice(row);
    }

    Array2::from_shape_vec((rows.len(), d), flat)
        .map_err(|e| KMeansError::invalid(format!("cannot shape point set: {}", e)))
}

/// Check that a point set can be clustered: at least one point, at least one
/// dimension and only finite coordinates.
pub fn validate_points(points: &ArrayView2<f64>) -> Result<(), KMeansError> {
    if points.nrows() == 0 {
        return Err(KMeansError::invalid("point set is empty"));
    }
    if points.ncols() == 0 {
        return Err(KMeansError::invalid("points must have at least one dimension"));
    }
    if let Some(((i, j), v)) = points.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(KMeansError::invalid(format!(
            "point {} has non-finite coordinate {} in dimension {}",
            i, v, j
        )));
    }
    Ok(())
}

/// Per-dimension minimum and maximum of a non-empty point set
pub fn bounding_box(points: &ArrayView2<f64>) -> (Array1<f64>, Array1<f64>) {
    let mins = points.fold_axis(Axis(0), f64::INFINITY, |&acc, &v| acc.min(v));
    let maxs = points.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v));
    (mins, maxs)
}
