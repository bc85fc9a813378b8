//! Seeded hold-out splits.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::result::{AiError, AiResult};

/// Row indices of one train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    pub fn select<T: Clone>(rows: &[T], indices: &[usize]) -> Vec<T> {
        indices.iter().map(|&i| rows[i].clone()).collect()
    }
}

fn test_count(n: usize, test_fraction: f64) -> usize {
    (n as f64 * test_fraction).ceil() as usize
}

fn check_fraction(test_fraction: f64) -> AiResult<()> {
    if test_fraction > 0.0 && test_fraction < 1.0 {
        Ok(())
    } else {
        Err(AiError::invalid(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )))
    }
}

/// Shuffle `0..n` and hold out `ceil(n * test_fraction)` rows.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> AiResult<Split> {
    check_fraction(test_fraction)?;
    let n_test = test_count(n, test_fraction);
    if n < 2 || n_test >= n {
        return Err(AiError::invalid(format!("cannot split {n} rows")));
    }

    let mut idx: Vec<usize> = (0..n).collect();
    idx.shuffle(&mut StdRng::seed_from_u64(seed));
    let train = idx.split_off(n_test);
    Ok(Split { train, test: idx })
}

/// Hold out the same fraction of each class so both partitions keep the
/// class balance of `labels`.
pub fn stratified_split(labels: &[bool], test_fraction: f64, seed: u64) -> AiResult<Split> {
    check_fraction(test_fraction)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::with_capacity(labels.len()),
        test: Vec::new(),
    };

    for class in [false, true] {
        let mut idx: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        if idx.len() < 2 {
            return Err(AiError::invalid(format!(
                "class {class} has {} rows; stratification needs at least 2",
                idx.len()
            )));
        }
        idx.shuffle(&mut rng);
        let n_test = test_count(idx.len(), test_fraction).min(idx.len() - 1);
        split.train.extend_from_slice(&idx[n_test..]);
        split.test.extend_from_slice(&idx[..n_test]);
    }

    split.train.shuffle(&mut rng);
    split.test.shuffle(&mut rng);
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_out_ceiling_of_fraction() {
        let split = train_test_split(101, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 21);
        assert_eq!(split.train.len(), 80);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_split() {
        assert_eq!(
            train_test_split(50, 0.2, 7).unwrap(),
            train_test_split(50, 0.2, 7).unwrap()
        );
    }

    #[test]
    fn stratified_keeps_class_ratio() {
        let labels: Vec<bool> = (0..100).map(|i| i % 5 == 0).collect();
        let split = stratified_split(&labels, 0.2, 42).unwrap();
        let positives = split.test.iter().filter(|&&i| labels[i]).count();
        assert_eq!(positives, 4);
        assert_eq!(split.test.len(), 20);
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert!(train_test_split(1, 0.2, 1).is_err());
        assert!(train_test_split(10, 1.5, 1).is_err());
        assert!(stratified_split(&[true, false, false], 0.2, 1).is_err());
    }
}
