//! Time-series cross-validation splits (forward chaining).
//!
//! Each fold trains on a prefix and validates on the window that follows
//! it, so no fold ever validates on data older than its training slice.

#[derive(Debug, Clone)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Forward-chaining splits over `n_samples` chronologically ordered rows.
///
/// Fold i trains on rows `0..(i+1)*w` and validates on the next window of
/// `w = n_samples / (n_splits + 1)` rows. Folds that would start past the
/// end are dropped, so fewer than `n_splits` splits can come back for
/// small inputs.
pub fn time_series_split(n_samples: usize, n_splits: usize) -> Vec<CvSplit> {
    assert!(n_splits > 0, "n_splits must be > 0");

    let window = n_samples / (n_splits + 1);
    if window == 0 {
        return Vec::new();
    }

    let mut splits = Vec::with_capacity(n_splits);
    for i in 0..n_splits {
        let test_start = (i + 1) * window;
        let test_end = (test_start + window).min(n_samples);
        if test_start >= n_samples || test_start == test_end {
            break;
        }
        splits.push(CvSplit {
            train_indices: (0..test_start).collect(),
            test_indices: (test_start..test_end).collect(),
        });
    }
    splits
}

/// Select the rows of a matrix (or label vector) named by `indices`.
pub fn select_rows<T: Clone>(rows: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| rows[i].clone()).collect()
}
