//! Basic example demonstrating the k-means oracle
//!
//! Run with: cargo run --example basic --release

use kmeans_oracle::compare::compare_runs;
use kmeans_oracle::{ClusteringEngine, KMeansConfig, ShiftMetric};
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

fn main() {
    println!("=== kmeans-oracle example ===\n");

    // Generate synthetic data: 3 clusters in 2D
    let n_samples = 300;
    let n_features = 2;
    let n_clusters = 3;

    println!("Generating {} samples with {} features...", n_samples, n_features);

    let centers = [[-5.0, -5.0], [0.0, 5.0], [5.0, -5.0]];
    let noise = Array2::random((n_samples, n_features), Uniform::new(-1.0, 1.0));
    let mut data = Array2::<f64>::zeros((n_samples, n_features));
    for i in 0..n_samples {
        let cluster_idx = i % n_clusters;
        data[[i, 0]] = centers[cluster_idx][0] + noise[[i, 0]];
        data[[i, 1]] = centers[cluster_idx][1] + noise[[i, 1]];
    }

    println!("True cluster centers:");
    for (i, center) in centers.iter().enumerate() {
        println!("  Cluster {}: ({:.2}, {:.2})", i, center[0], center[1]);
    }
    println!();

    // Two runs from different random starts play the oracle and the candidate
    let config = KMeansConfig::new(n_clusters)
        .with_max_iters(100)
        .with_shift_metric(ShiftMetric::MaxAbs);

    println!("Running k-means with k={}...\n", n_clusters);

    let reference = ClusteringEngine::with_config(config.clone().with_seed(1))
        .fit(&data.view())
        .expect("Reference run failed");
    let candidate = ClusteringEngine::with_config(config.with_seed(2))
        .fit(&data.view())
        .expect("Candidate run failed");

    println!(
        "Reference: {:?} after {} iteration(s)",
        reference.termination(),
        reference.n_iterations
    );
    for (i, (centroid, size)) in reference
        .centroids
        .outer_iter()
        .zip(reference.cluster_sizes())
        .enumerate()
    {
        println!(
            "  Centroid {}: ({:.4}, {:.4}) with {} samples",
            i, centroid[0], centroid[1], size
        );
    }
    println!("  Inertia: {:.4}\n", reference.inertia(&data.view()));

    let comparison = compare_runs(&reference, &candidate, 1e-6).expect("Comparison failed");
    println!("Candidate vs reference:");
    println!("  Centroid pairing: {:?}", comparison.matching.permutation);
    println!("  Max centroid distance: {:.6}", comparison.matching.max_distance);
    println!("  Label agreement: {:.1}%", comparison.label_agreement * 100.0);
    println!("  Within tolerance: {}", comparison.within_tolerance);

    println!("\n=== Done! ===");
}
