//! Classification metrics: accuracy, confusion matrix and a per-class
//! precision/recall/F1 report, all over encoded class indices.

/// Fraction of predictions matching the truth. Empty input scores 0.0.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    assert_eq!(y_true.len(), y_pred.len(), "length mismatch");
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Row-major confusion matrix: `matrix[truth][prediction]`.
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0usize; n_classes]; n_classes];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if t < n_classes && p < n_classes {
            matrix[t][p] += 1;
        }
    }
    matrix
}

/// Per-class precision, recall, F1 and support.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassReport {
    pub class: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

pub fn classification_report(
    y_true: &[usize],
    y_pred: &[usize],
    n_classes: usize,
) -> Vec<ClassReport> {
    let matrix = confusion_matrix(y_true, y_pred, n_classes);

    (0..n_classes)
        .map(|c| {
            let tp = matrix[c][c];
            let predicted: usize = (0..n_classes).map(|t| matrix[t][c]).sum();
            let support: usize = matrix[c].iter().sum();

            let precision = if predicted == 0 {
                0.0
            } else {
                tp as f64 / predicted as f64
            };
            let recall = if support == 0 {
                0.0
            } else {
                tp as f64 / support as f64
            };
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };

            ClassReport {
                class: c,
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect()
}
