//! K-means segmentation of records over a numeric feature subset.

use crate::tables;
use insights_core::artifact::{ClusterAssignment, ClusterCentroid, ClusterResult};
use insights_core::config::ClusteringConfig;
use insights_core::{CleanTable, InsightsError, InsightsResult};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

pub const ANALYSIS: &str = "clusters";

/// Lloyd's k-means with k-means++ seeding.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub k: usize,
    pub max_iterations: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub centroids: Array2<f64>,
    pub iterations: usize,
    pub converged: bool,
    pub inertia: f64,
}

impl KMeans {
    pub fn new(k: usize, max_iterations: usize, seed: u64) -> Self {
        Self {
            k,
            max_iterations,
            seed,
        }
    }

    /// Cluster the rows of `data`. `None` when there are fewer rows than
    /// clusters or no clusters at all.
    pub fn fit(&self, data: &Array2<f64>) -> Option<KMeansFit> {
        let n = data.nrows();
        if self.k == 0 || n < self.k {
            return None;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = self.seed_centroids(data, &mut rng);
        let mut labels: Vec<usize> = Vec::new();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;
            let next = assign(data, &centroids);
            if next == labels {
                converged = true;
                break;
            }
            labels = next;
            centroids = update(data, &labels, &centroids);
        }
        if !converged {
            labels = assign(data, &centroids);
        }

        let inertia = data
            .axis_iter(Axis(0))
            .zip(&labels)
            .map(|(row, &c)| squared_distance(&row.to_vec(), &centroids.row(c).to_vec()))
            .sum();

        Some(KMeansFit {
            labels,
            centroids,
            iterations,
            converged,
            inertia,
        })
    }

    /// k-means++: each next centre is drawn with probability proportional to
    /// its squared distance from the nearest chosen centre.
    fn seed_centroids(&self, data: &Array2<f64>, rng: &mut StdRng) -> Array2<f64> {
        let n = data.nrows();
        let mut chosen = vec![rng.gen_range(0..n)];

        while chosen.len() < self.k {
            let distances: Vec<f64> = data
                .axis_iter(Axis(0))
                .map(|row| {
                    chosen
                        .iter()
                        .map(|&c| squared_distance(&row.to_vec(), &data.row(c).to_vec()))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();
            let total: f64 = distances.iter().sum();

            let next = if total > 0.0 {
                let mut target = rng.gen::<f64>() * total;
                let mut pick = n - 1;
                for (i, d) in distances.iter().enumerate() {
                    if *d > 0.0 && target < *d {
                        pick = i;
                        break;
                    }
                    target -= d;
                }
                pick
            } else {
                rng.gen_range(0..n)
            };
            chosen.push(next);
        }

        let mut centroids = Array2::<f64>::zeros((self.k, data.ncols()));
        for (i, &row) in chosen.iter().enumerate() {
            centroids.row_mut(i).assign(&data.row(row));
        }
        centroids
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Nearest centroid per row; ties go to the lower cluster index.
fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.axis_iter(Axis(0))
        .map(|row| {
            let row = row.to_vec();
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (c, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
                let d = squared_distance(&row, &centroid.to_vec());
                if d < best_distance {
                    best = c;
                    best_distance = d;
                }
            }
            best
        })
        .collect()
}

/// Mean of each cluster's members; an empty cluster keeps its centroid.
fn update(data: &Array2<f64>, labels: &[usize], previous: &Array2<f64>) -> Array2<f64> {
    let mut sums = Array2::<f64>::zeros(previous.raw_dim());
    let mut counts = vec![0usize; previous.nrows()];
    for (row, &c) in data.axis_iter(Axis(0)).zip(labels) {
        let mut slot = sums.row_mut(c);
        slot += &row;
        counts[c] += 1;
    }
    let mut centroids = previous.clone();
    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            centroids.row_mut(c).assign(&(&sums.row(c) / count as f64));
        }
    }
    centroids
}

/// Column means and population standard deviations; a constant column gets
/// a deviation of 1 so it standardises to zeros.
fn standardise(data: &Array2<f64>) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
    let means = data
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(data.ncols()));
    let stds = data
        .std_axis(Axis(0), 0.0)
        .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
    let scaled = (data - &means) / &stds;
    (scaled, means, stds)
}

/// Segment the rows of `table` on `config.features` into `k` clusters.
///
/// Returns the result and, when the iteration cap was hit, a warning for
/// the artifact.
pub fn cluster(
    table: &CleanTable,
    config: &ClusteringConfig,
    k: usize,
    seed: u64,
) -> InsightsResult<(ClusterResult, Option<String>)> {
    let columns: Vec<Vec<Option<f64>>> = config
        .features
        .iter()
        .map(|f| tables::numbers(ANALYSIS, table, f))
        .collect::<InsightsResult<_>>()?;
    let labels = table.texts(&config.label_column);

    let rows: Vec<(usize, Vec<f64>)> = (0..table.len())
        .filter_map(|row| {
            let values: Option<Vec<f64>> = columns.iter().map(|c| c[row]).collect();
            values.map(|v| (row, v))
        })
        .collect();

    if k == 0 {
        return Err(InsightsError::degraded(ANALYSIS, "cluster count is zero"));
    }
    if rows.len() < k {
        return Err(InsightsError::degraded(
            ANALYSIS,
            format!("{} usable rows for {k} clusters", rows.len()),
        ));
    }

    let mut data = Array2::<f64>::zeros((rows.len(), config.features.len()));
    for (i, (_, values)) in rows.iter().enumerate() {
        for (j, v) in values.iter().enumerate() {
            data[[i, j]] = *v;
        }
    }

    let (scaled, means, stds) = standardise(&data);
    let fit = KMeans::new(k, config.max_iterations, seed)
        .fit(&scaled)
        .ok_or_else(|| InsightsError::degraded(ANALYSIS, "k-means could not be fitted"))?;

    let warning = if fit.converged {
        None
    } else {
        warn!(
            iterations = fit.iterations,
            "K-means hit the iteration cap before converging"
        );
        Some(format!(
            "clustering stopped at the iteration cap ({}) before converging",
            config.max_iterations
        ))
    };

    // Centroids back in original units, then relabelled by ascending first
    // feature so labels do not depend on seeding order.
    let centers: Vec<Vec<f64>> = fit
        .centroids
        .axis_iter(Axis(0))
        .map(|c| (&c * &stds + &means).to_vec())
        .collect();
    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| centers[a][0].total_cmp(&centers[b][0]).then(a.cmp(&b)));
    let mut relabel = vec![0usize; k];
    for (new, &old) in order.iter().enumerate() {
        relabel[old] = new;
    }

    let mut sizes = vec![0usize; k];
    let assignments: Vec<ClusterAssignment> = rows
        .iter()
        .zip(&fit.labels)
        .map(|((row, _), &label)| {
            let cluster = relabel[label];
            sizes[cluster] += 1;
            ClusterAssignment {
                row: *row,
                label: labels
                    .as_ref()
                    .and_then(|l| l[*row])
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("row {}", row + 1)),
                cluster,
            }
        })
        .collect();

    let centroids = order
        .iter()
        .enumerate()
        .map(|(new, &old)| ClusterCentroid {
            cluster: new,
            size: sizes[new],
            center: centers[old].clone(),
        })
        .collect();

    info!(
        sheet = %table.name,
        k,
        rows = rows.len(),
        iterations = fit.iterations,
        inertia = fit.inertia,
        "Clusters fitted"
    );

    Ok((
        ClusterResult {
            sheet: table.name.clone(),
            features: config.features.clone(),
            k,
            iterations: fit.iterations,
            converged: fit.converged,
            inertia: fit.inertia,
            centroids,
            assignments,
        },
        warning,
    ))
}
