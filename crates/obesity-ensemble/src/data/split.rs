//! Seeded, stratified train/test partitioning.
//!
//! Test-set size is `ceil(n * test_size)`. Each class receives a share of the
//! test rows proportional to its frequency (largest-remainder rounding, ties
//! broken by class index), rows are drawn per class from a seeded shuffle,
//! and both partitions are shuffled once more so classes are interleaved.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Errors raised when a stratified split is impossible.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplitError {
    #[error("test_size must be in (0, 1), got {0}")]
    InvalidTestSize(f64),

    #[error("class {class} has {count} row(s); stratification needs at least 2")]
    ClassTooSmall { class: u32, count: usize },

    #[error("{partition} partition of {size} rows cannot hold all {n_classes} classes")]
    PartitionTooSmall {
        partition: &'static str,
        size: usize,
        n_classes: usize,
    },
}

/// Split row indices into train and test partitions, preserving class
/// proportions.
///
/// The same `labels`, `test_size` and `seed` always produce the same split.
///
/// # Errors
///
/// Returns [`SplitError`] if `test_size` is outside (0, 1), a class has
/// fewer than 2 rows, or either partition is smaller than the number of
/// classes.
pub fn stratified_split(
    labels: &[u32],
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit, SplitError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SplitError::InvalidTestSize(test_size));
    }

    let n = labels.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    let n_train = n - n_test;

    // Group rows by class (classes ordered by label value)
    let n_labels = labels.iter().max().map_or(0, |&m| m as usize + 1);
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_labels];
    for (row, &label) in labels.iter().enumerate() {
        by_class[label as usize].push(row);
    }
    let classes: Vec<(u32, Vec<usize>)> = by_class
        .into_iter()
        .enumerate()
        .filter(|(_, rows)| !rows.is_empty())
        .map(|(class, rows)| (class as u32, rows))
        .collect();

    if let Some((class, rows)) = classes.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(SplitError::ClassTooSmall { class: *class, count: rows.len() });
    }
    for (partition, size) in [("train", n_train), ("test", n_test)] {
        if size < classes.len() {
            return Err(SplitError::PartitionTooSmall {
                partition,
                size,
                n_classes: classes.len(),
            });
        }
    }

    let counts: Vec<usize> = classes.iter().map(|(_, rows)| rows.len()).collect();
    let test_counts = allocate_proportionally(&counts, n_test);

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for ((_, rows), &n_class_test) in classes.iter().zip(&test_counts) {
        let mut rows = rows.clone();
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..n_class_test]);
        train.extend_from_slice(&rows[n_class_test..]);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(TrainTestSplit { train, test })
}

/// Distribute `total` across groups proportionally to `counts`.
///
/// Floors the exact shares, then hands the remainder to the groups with the
/// largest fractional parts. No group receives more than its count.
fn allocate_proportionally(counts: &[usize], total: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    if n == 0 {
        return vec![0; counts.len()];
    }

    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 * total as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = exact.iter().map(|&e| e.floor() as usize).collect();

    let mut remaining = total.saturating_sub(alloc.iter().sum());
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
    });

    while remaining > 0 {
        let before = remaining;
        for &group in &order {
            if remaining == 0 {
                break;
            }
            if alloc[group] < counts[group] {
                alloc[group] += 1;
                remaining -= 1;
            }
        }
        if remaining == before {
            break;
        }
    }
    alloc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(counts: &[usize]) -> Vec<u32> {
        counts
            .iter()
            .enumerate()
            .flat_map(|(class, &count)| std::iter::repeat(class as u32).take(count))
            .collect()
    }

    #[test]
    fn sizes_follow_ceil_rule() {
        let y = labels(&[50, 30, 21]);
        let split = stratified_split(&y, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 21); // ceil(101 * 0.2)
        assert_eq!(split.train.len(), 80);
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let y = labels(&[40, 25, 35]);
        let split = stratified_split(&y, 0.2, 7).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..y.len()).collect::<Vec<_>>());
    }

    #[test]
    fn class_proportions_are_preserved() {
        let counts = [120, 60, 20];
        let y = labels(&counts);
        let split = stratified_split(&y, 0.2, 42).unwrap();

        for (class, &count) in counts.iter().enumerate() {
            let in_test = split.test.iter().filter(|&&r| y[r] == class as u32).count();
            let expected = count as f64 * split.test.len() as f64 / y.len() as f64;
            assert!((in_test as f64 - expected).abs() <= 1.0, "class {class}: {in_test} vs {expected}");
        }
    }

    #[test]
    fn same_seed_same_split() {
        let y = labels(&[30, 30, 30]);
        assert_eq!(stratified_split(&y, 0.2, 42).unwrap(), stratified_split(&y, 0.2, 42).unwrap());
        assert_ne!(stratified_split(&y, 0.2, 42).unwrap(), stratified_split(&y, 0.2, 43).unwrap());
    }

    #[test]
    fn rejects_singleton_class() {
        let y = labels(&[10, 1, 10]);
        let err = stratified_split(&y, 0.2, 42).unwrap_err();
        assert_eq!(err, SplitError::ClassTooSmall { class: 1, count: 1 });
    }

    #[test]
    fn rejects_bad_test_size() {
        let y = labels(&[10, 10]);
        assert!(matches!(stratified_split(&y, 0.0, 42), Err(SplitError::InvalidTestSize(_))));
        assert!(matches!(stratified_split(&y, 1.0, 42), Err(SplitError::InvalidTestSize(_))));
    }

    #[test]
    fn allocation_sums_to_total() {
        assert_eq!(allocate_proportionally(&[5, 5, 5], 4).iter().sum::<usize>(), 4);
        assert_eq!(allocate_proportionally(&[1, 1], 2), vec![1, 1]);
        assert_eq!(allocate_proportionally(&[10, 30], 8), vec![2, 6]);
    }
}
