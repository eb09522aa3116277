//! Command-line front end of the reference k-means oracle.
//!
//! Reads points from a CSV file, clusters them, prints the assignment of
//! every point and optionally writes labels and centroids to `.npy` files for
//! comparison with other implementations.
//!
//! Usage: `kmeans-oracle <k> [--input data.csv] [--max-iters N] [--seed S]`

use anyhow::{bail, Context};
use clap::Parser;
use kmeans_oracle::compare::match_centroids;
use kmeans_oracle::dataset::load_csv;
use kmeans_oracle::{ClusteringEngine, KMeansConfig, ShiftMetric, Termination};
use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Reference k-means clustering
#[derive(Parser, Debug)]
#[command(name = "kmeans-oracle", version, about)]
struct Cli {
    /// Number of clusters
    k: usize,

    /// Headered CSV file holding the points
    #[arg(short, long, default_value = "../data_original.csv")]
    input: PathBuf,

    /// Comma-separated numeric columns to read
    #[arg(short, long, value_delimiter = ',', default_value = "x,y")]
    columns: Vec<String>,

    /// Iteration cap
    #[arg(short = 'm', long, default_value_t = 1)]
    max_iters: usize,

    /// Convergence threshold
    #[arg(long, default_value_t = 1e-4)]
    tol: f64,

    /// Seed for centroid initialization (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Use max(|old - new|) instead of the signed max(old - new) shift
    #[arg(long)]
    abs_shift: bool,

    /// Run the assignment step on the calling thread only
    #[arg(long)]
    serial: bool,

    /// Write labels (u64, one per point) to this .npy file
    #[arg(long)]
    labels_out: Option<PathBuf>,

    /// Write centroids (f64, k x d) to this .npy file
    #[arg(long)]
    centroids_out: Option<PathBuf>,

    /// Compare the result against centroids stored in this .npy file
    #[arg(long)]
    reference_centroids: Option<PathBuf>,

    /// Maximum paired-centroid distance accepted by the comparison
    #[arg(long, default_value_t = 1e-3)]
    compare_tol: f64,

    /// Skip the per-point listing
    #[arg(short, long)]
    quiet: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let columns: Vec<&str> = cli.columns.iter().map(String::as_str).collect();
    let points = load_csv(&cli.input, &columns)
        .with_context(|| format!("cannot load dataset {}", cli.input.display()))?;

    info!(
        n_points = points.nrows(),
        n_features = points.ncols(),
        "loaded dataset"
    );

    let mut config = KMeansConfig::new(cli.k)
        .with_max_iters(cli.max_iters)
        .with_tol(cli.tol)
        .with_parallel(!cli.serial);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if cli.abs_shift {
        config = config.with_shift_metric(ShiftMetric::MaxAbs);
    }

    let result = ClusteringEngine::with_config(config).fit(&points.view())?;

    if !cli.quiet {
        for (i, (point, &label)) in points.outer_iter().zip(result.labels.iter()).enumerate() {
            let centroid = result.centroids.row(label);
            println!(
                "point {} {:?} is in cluster {} (with centroid {:?})",
                i,
                point.to_vec(),
                label,
                centroid.to_vec()
            );
        }
    }

    for (i, (centroid, size)) in result
        .centroids
        .outer_iter()
        .zip(result.cluster_sizes())
        .enumerate()
    {
        println!("Cluster {} has {} point(s), centroid {:?}", i, size, centroid.to_vec());
    }

    match result.termination() {
        Termination::Converged => println!(
            "Converged after {} iteration(s), shift {:.6}",
            result.n_iterations, result.shift
        ),
        Termination::IterationCap => println!(
            "Stopped at iteration cap ({}), shift {:.6}",
            result.n_iterations, result.shift
        ),
    }
    println!("Inertia: {:.6}", result.inertia(&points.view()));

    if let Some(path) = &cli.labels_out {
        let labels = result.labels.mapv(|l| l as u64);
        labels
            .write_npy(create_output(path)?)
            .with_context(|| format!("cannot write labels to {}", path.display()))?;
        info!(path = %path.display(), "saved labels");
    }

    if let Some(path) = &cli.centroids_out {
        result
            .centroids
            .write_npy(create_output(path)?)
            .with_context(|| format!("cannot write centroids to {}", path.display()))?;
        info!(path = %path.display(), "saved centroids");
    }

    if let Some(path) = &cli.reference_centroids {
        let reader = BufReader::new(
            File::open(path).with_context(|| format!("cannot open {}", path.display()))?,
        );
        let reference = Array2::<f64>::read_npy(reader)
            .with_context(|| format!("cannot read reference centroids from {}", path.display()))?;
        let matching = match_centroids(&reference.view(), &result.centroids.view())?;

        println!(
            "Reference match: permutation {:?}, max centroid distance {:.6}",
            matching.permutation, matching.max_distance
        );
        if matching.max_distance > cli.compare_tol {
            bail!(
                "centroids differ from reference by {} (tolerance {})",
                matching.max_distance,
                cli.compare_tol
            );
        }
    }

    Ok(())
}

fn create_output(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(BufWriter::new(file))
}
