//! Lloyd's k-means with k-means++ seeding and multiple restarts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::result::{AiError, AiResult, check_matrix, check_width};
use crate::stats::squared_distance;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KMeansParams {
    pub n_clusters: usize,
    pub n_init: usize,
    pub max_iter: usize,
    /// Convergence threshold on total squared centroid movement.
    pub tol: f64,
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            n_clusters: 4,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeans {
    centroids: Vec<Vec<f64>>,
    inertia: f64,
}

impl KMeans {
    /// Run `n_init` seeded restarts and keep the lowest-inertia solution.
    pub fn fit(x: &[Vec<f64>], params: KMeansParams) -> AiResult<Self> {
        check_matrix(x)?;
        if params.n_clusters == 0 || x.len() < params.n_clusters {
            return Err(AiError::invalid(format!(
                "cannot form {} clusters from {} rows",
                params.n_clusters,
                x.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut best: Option<KMeans> = None;
        for run in 0..params.n_init.max(1) {
            let candidate = lloyd(x, plus_plus_init(x, params.n_clusters, &mut rng), &params);
            debug!(run, inertia = candidate.inertia, "k-means restart finished");
            if best.as_ref().is_none_or(|b| candidate.inertia < b.inertia) {
                best = Some(candidate);
            }
        }
        best.ok_or_else(|| AiError::fit_failed("k-means produced no solution"))
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    pub fn centroids(&self) -> &[Vec<f64>] {
        &self.centroids
    }

    /// Sum of squared distances of training rows to their centroid.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn predict(&self, row: &[f64]) -> AiResult<usize> {
        let width = self.centroids.first().map_or(0, Vec::len);
        check_width(width, row)?;
        Ok(nearest(&self.centroids, row).0)
    }
}

fn nearest(centroids: &[Vec<f64>], row: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(row, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn plus_plus_init(x: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = vec![x[rng.gen_range(0..x.len())].clone()];
    let mut dist: Vec<f64> = x.iter().map(|r| squared_distance(r, &centroids[0])).collect();

    while centroids.len() < k {
        let total: f64 = dist.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.r#gen::<f64>() * total;
            let mut chosen = x.len() - 1;
            for (i, d) in dist.iter().enumerate() {
                if target < *d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            rng.gen_range(0..x.len())
        };
        let centroid = x[pick].clone();
        for (d, row) in dist.iter_mut().zip(x) {
            *d = d.min(squared_distance(row, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn lloyd(x: &[Vec<f64>], mut centroids: Vec<Vec<f64>>, params: &KMeansParams) -> KMeans {
    let k = centroids.len();
    let width = centroids[0].len();
    let mut labels = vec![0usize; x.len()];

    for _ in 0..params.max_iter {
        for (label, row) in labels.iter_mut().zip(x) {
            *label = nearest(&centroids, row).0;
        }

        let mut sums = vec![vec![0.0; width]; k];
        let mut counts = vec![0usize; k];
        for (row, &l) in x.iter().zip(&labels) {
            counts[l] += 1;
            for (s, v) in sums[l].iter_mut().zip(row) {
                *s += v;
            }
        }

        let mut updated: Vec<Vec<f64>> = Vec::with_capacity(k);
        for c in 0..k {
            if counts[c] == 0 {
                // Re-seed an empty cluster at the row farthest from its centroid.
                let far = x
                    .iter()
                    .enumerate()
                    .map(|(i, r)| (i, squared_distance(r, &centroids[labels[i]])))
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map_or(0, |(i, _)| i);
                updated.push(x[far].clone());
            } else {
                updated.push(sums[c].iter().map(|s| s / counts[c] as f64).collect());
            }
        }

        let shift: f64 = centroids
            .iter()
            .zip(&updated)
            .map(|(a, b)| squared_distance(a, b))
            .sum();
        centroids = updated;
        if shift <= params.tol {
            break;
        }
    }

    let inertia = x.iter().map(|r| nearest(&centroids, r).1).sum();
    KMeans { centroids, inertia }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> Vec<Vec<f64>> {
        let mut x = Vec::new();
        for (cx, cy) in [(0.0, 0.0), (10.0, 10.0), (0.0, 10.0)] {
            for i in 0..10 {
                let j = i as f64 / 10.0;
                x.push(vec![cx + j, cy - j]);
            }
        }
        x
    }

    #[test]
    fn separates_well_spaced_blobs() {
        let x = blobs();
        let params = KMeansParams {
            n_clusters: 3,
            ..KMeansParams::default()
        };
        let model = KMeans::fit(&x, params).unwrap();
        let labels: Vec<usize> = x.iter().map(|r| model.predict(r).unwrap()).collect();
        for blob in labels.chunks(10) {
            assert!(blob.iter().all(|l| *l == blob[0]));
        }
        assert_ne!(labels[0], labels[10]);
        assert_ne!(labels[10], labels[20]);
        assert_ne!(labels[0], labels[20]);
    }

    #[test]
    fn restarts_are_seeded() {
        let x = blobs();
        let a = KMeans::fit(&x, KMeansParams::default()).unwrap();
        let b = KMeans::fit(&x, KMeansParams::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.n_clusters(), 4);
    }

    #[test]
    fn rejects_more_clusters_than_rows() {
        let x = vec![vec![1.0], vec![2.0]];
        assert!(KMeans::fit(&x, KMeansParams::default()).is_err());
    }
}
