//! Metrics Module
//!
//! Running statistics for training phases and top-k accuracy counting for
//! evaluation. Everything here is pure bookkeeping over scalar values, so it
//! stays independent of the tensor backend.

use serde::{Deserialize, Serialize};

/// Accumulator for one phase of one epoch.
///
/// Loss is accumulated as `loss * batch_len` so the epoch loss is the
/// per-example mean over the whole split, independent of a short final batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningTotals {
    /// Sum of batch losses weighted by batch length
    pub loss_sum: f64,
    /// Number of correct top-1 predictions
    pub correct: usize,
    /// Number of examples seen
    pub seen: usize,
}

impl RunningTotals {
    /// Fold in one batch worth of statistics
    pub fn add_batch(&mut self, loss: f64, batch_len: usize, correct: usize) {
        self.loss_sum += loss * batch_len as f64;
        self.correct += correct;
        self.seen += batch_len;
    }

    /// Mean loss over the split
    pub fn epoch_loss(&self, split_size: usize) -> f64 {
        if split_size == 0 {
            return 0.0;
        }
        self.loss_sum / split_size as f64
    }

    /// Accuracy over the split
    pub fn epoch_accuracy(&self, split_size: usize) -> f64 {
        if split_size == 0 {
            return 0.0;
        }
        self.correct as f64 / split_size as f64
    }
}

/// Test-set evaluation result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    /// Fraction of examples whose top prediction matches the label
    pub top1: f64,
    /// Fraction of examples whose label is among the 5 highest-scored classes
    pub top5: f64,
    /// Number of examples evaluated
    pub samples: usize,
}

impl EvalReport {
    /// Print the report to the console
    pub fn print(&self) {
        println!("Test accuracy (top-1): {:.4}", self.top1);
        println!("Test accuracy (top-5): {:.4}", self.top5);
    }
}

/// Whether `label` is among the `k` highest-scored classes of one row.
///
/// Ties are broken in favor of the lower class index, matching a stable
/// descending sort over scores.
pub fn top_k_hit(scores: &[f32], label: usize, k: usize) -> bool {
    if label >= scores.len() {
        return false;
    }
    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    indexed.iter().take(k).any(|&(idx, _)| idx == label)
}

/// Count top-1 and top-5 hits over a row-major score matrix.
///
/// `scores` holds `labels.len()` rows of `num_classes` entries each.
pub fn count_top_hits(scores: &[f32], labels: &[i64], num_classes: usize) -> (usize, usize) {
    debug_assert_eq!(scores.len(), labels.len() * num_classes);

    let mut top1 = 0usize;
    let mut top5 = 0usize;

    for (row, &label) in scores.chunks(num_classes).zip(labels.iter()) {
        let label = label as usize;
        if top_k_hit(row, label, 1) {
            top1 += 1;
        }
        if top_k_hit(row, label, 5) {
            top5 += 1;
        }
    }

    (top1, top5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_totals_weighted_loss() {
        let mut totals = RunningTotals::default();
        // Two full batches of 4 and a short final batch of 2
        totals.add_batch(1.0, 4, 3);
        totals.add_batch(0.5, 4, 2);
        totals.add_batch(2.0, 2, 1);

        assert_eq!(totals.seen, 10);
        // (1.0*4 + 0.5*4 + 2.0*2) / 10 = 1.0
        assert!((totals.epoch_loss(10) - 1.0).abs() < 1e-12);
        assert!((totals.epoch_accuracy(10) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_epoch_metrics_bounds() {
        let mut totals = RunningTotals::default();
        totals.add_batch(0.7, 8, 5);
        totals.add_batch(1.3, 8, 8);

        let loss = totals.epoch_loss(16);
        let acc = totals.epoch_accuracy(16);
        assert!(loss >= 0.0);
        assert!((0.0..=1.0).contains(&acc));
    }

    #[test]
    fn test_top_k_hit() {
        let scores = [0.1, 0.5, 0.05, 0.3, 0.05];
        assert!(top_k_hit(&scores, 1, 1));
        assert!(!top_k_hit(&scores, 3, 1));
        assert!(top_k_hit(&scores, 3, 2));
        assert!(!top_k_hit(&scores, 2, 3));
    }

    #[test]
    fn test_top5_never_below_top1() {
        // 3 rows over 8 classes with varying label placement
        let scores: Vec<f32> = vec![
            0.5, 0.1, 0.1, 0.1, 0.05, 0.05, 0.05, 0.05, // label 0: top-1 hit
            0.1, 0.1, 0.4, 0.2, 0.1, 0.05, 0.03, 0.02, // label 3: top-5 only
            0.2, 0.2, 0.2, 0.1, 0.1, 0.1, 0.05, 0.05, // label 7: miss
        ];
        let labels = [0i64, 3, 7];

        let (top1, top5) = count_top_hits(&scores, &labels, 8);
        assert!(top5 >= top1);
        assert_eq!(top1, 1);
        assert_eq!(top5, 2);
    }

    #[test]
    fn test_count_top_hits_idempotent() {
        let scores: Vec<f32> = (0..48).map(|i| (i % 7) as f32 / 7.0).collect();
        let labels = [2i64, 5, 0, 11];

        let first = count_top_hits(&scores, &labels, 12);
        let second = count_top_hits(&scores, &labels, 12);
        assert_eq!(first, second);
    }
}
