//! Hold-out evaluation metrics.
//!
//! Degenerate denominators (no positives, constant targets, a single
//! cluster) yield 0.0 rather than NaN so metrics records stay serializable.

use crate::stats::{self, squared_distance};

pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let m = stats::mean(y_true);
    let ss_tot: f64 = y_true.iter().map(|y| (y - m).powi(2)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(y, p)| (y - p).powi(2)).sum();
    1.0 - ss_res / ss_tot
}

pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let errors: Vec<f64> = y_true.iter().zip(y_pred).map(|(y, p)| (y - p).abs()).collect();
    stats::mean(&errors)
}

pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let errors: Vec<f64> = y_true.iter().zip(y_pred).map(|(y, p)| (y - p).powi(2)).collect();
    stats::mean(&errors).sqrt()
}

/// Binary confusion counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confusion {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl Confusion {
    pub fn from_labels(y_true: &[bool], y_pred: &[bool]) -> Self {
        let mut c = Confusion::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (true, true) => c.tp += 1,
                (false, true) => c.fp += 1,
                (false, false) => c.tn += 1,
                (true, false) => c.fn_ += 1,
            }
        }
        c
    }

    fn ratio(num: usize, den: usize) -> f64 {
        if den == 0 { 0.0 } else { num as f64 / den as f64 }
    }

    pub fn accuracy(&self) -> f64 {
        Self::ratio(self.tp + self.tn, self.tp + self.tn + self.fp + self.fn_)
    }

    pub fn precision(&self) -> f64 {
        Self::ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        Self::ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }
}

/// Area under the ROC curve via the rank-sum statistic (ties averaged).
pub fn roc_auc(y_true: &[bool], scores: &[f64]) -> f64 {
    let n_pos = y_true.iter().filter(|&&t| t).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.0;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based average rank of the tie block.
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = rank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = ranks
        .iter()
        .zip(y_true)
        .filter(|(_, t)| **t)
        .map(|(r, _)| r)
        .sum();
    let n_pos = n_pos as f64;
    (pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64)
}

/// Mean silhouette coefficient over all points (Euclidean distance).
///
/// Points in singleton clusters score 0. Fewer than two non-empty clusters
/// yields 0.
pub fn silhouette_score(x: &[Vec<f64>], labels: &[usize]) -> f64 {
    let k = labels.iter().copied().max().map_or(0, |m| m + 1);
    let mut sizes = vec![0usize; k];
    for &l in labels {
        sizes[l] += 1;
    }
    if sizes.iter().filter(|&&s| s > 0).count() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    for (i, xi) in x.iter().enumerate() {
        let own = labels[i];
        if sizes[own] <= 1 {
            continue;
        }
        let mut sums = vec![0.0; k];
        for (j, xj) in x.iter().enumerate() {
            if i != j {
                sums[labels[j]] += squared_distance(xi, xj).sqrt();
            }
        }
        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own && sizes[c] > 0)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);
        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }
    total / x.len() as f64
}
