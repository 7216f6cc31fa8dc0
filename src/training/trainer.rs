//! Training Loop
//!
//! The heart of the pipeline: a per-epoch state machine that runs a training
//! phase and a validation phase, tracks the best-performing weight snapshot
//! by validation accuracy, and stops early once validation loss has gone a
//! fixed number of consecutive epochs without improving.
//!
//! The two criteria are deliberately decoupled: accuracy selects the snapshot
//! that is ultimately returned, loss decides when to stop.

use std::path::PathBuf;

use burn::data::dataloader::batcher::Batcher;
use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::GradientsParams;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Int, Tensor};
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::dataset::batcher::{num_batches, FolderDataset, ImageBatcher};
use crate::dataset::loader::DataSplits;
use crate::dataset::Split;
use crate::model::vgg::Vgg16;
use crate::training::optimizer::TuneOptimizer;
use crate::training::scheduler::LrSchedule;
use crate::utils::charts;
use crate::utils::error::{Result, TuneError};
use crate::utils::logging::EpochLogger;
use crate::utils::metrics::RunningTotals;

/// The phase within an epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Training,
    Validating,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Training => f.write_str("train"),
            Phase::Validating => f.write_str("val"),
        }
    }
}

/// Why the loop terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Validation loss went `patience` consecutive epochs without improving
    Early { epoch: usize },
    /// The epoch budget ran out
    Budget,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Early { epoch } => write!(f, "early stop at epoch {}", epoch),
            StopReason::Budget => f.write_str("epoch budget exhausted"),
        }
    }
}

/// Loss-based early stopping.
///
/// The counter resets only on a strict decrease below the running minimum;
/// matching the minimum counts as a stale epoch.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    min_loss: f64,
    stale_epochs: usize,
}

impl EarlyStopping {
    /// Create with the given patience (consecutive stale epochs before stop)
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            min_loss: f64::INFINITY,
            stale_epochs: 0,
        }
    }

    /// Feed one epoch's validation loss; returns true when the run must stop
    pub fn observe(&mut self, loss: f64) -> bool {
        if loss < self.min_loss {
            self.min_loss = loss;
            self.stale_epochs = 0;
            false
        } else {
            self.stale_epochs += 1;
            self.stale_epochs >= self.patience
        }
    }

    /// Minimum validation loss seen so far
    pub fn min_loss(&self) -> f64 {
        self.min_loss
    }

    /// Consecutive epochs without improvement
    pub fn stale_epochs(&self) -> usize {
        self.stale_epochs
    }

    /// Configured patience
    pub fn patience(&self) -> usize {
        self.patience
    }
}

/// What one validation phase meant for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Validation accuracy strictly improved; the caller must snapshot
    pub new_best: bool,
    /// The early-stopping threshold was reached
    pub stop: bool,
}

/// Mutable state of one training run: per-epoch history, best-accuracy
/// tracking, and the early-stopping counter.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Per-epoch training loss
    pub train_losses: Vec<f64>,
    /// Per-epoch training accuracy
    pub train_accuracies: Vec<f64>,
    /// Per-epoch validation loss
    pub val_losses: Vec<f64>,
    /// Per-epoch validation accuracy
    pub val_accuracies: Vec<f64>,
    /// Best validation accuracy seen so far
    pub best_val_accuracy: f64,
    early: EarlyStopping,
}

impl RunState {
    /// Create a fresh run state
    pub fn new(patience: usize) -> Self {
        Self {
            train_losses: Vec::new(),
            train_accuracies: Vec::new(),
            val_losses: Vec::new(),
            val_accuracies: Vec::new(),
            best_val_accuracy: 0.0,
            early: EarlyStopping::new(patience),
        }
    }

    /// Record the training phase of the current epoch
    pub fn record_train(&mut self, loss: f64, accuracy: f64) {
        self.train_losses.push(loss);
        self.train_accuracies.push(accuracy);
    }

    /// Record the validation phase and evaluate both run-control criteria:
    /// best-snapshot selection (accuracy, strict `>`) and early stopping
    /// (loss vs. running minimum).
    pub fn observe_validation(&mut self, loss: f64, accuracy: f64) -> ValidationOutcome {
        self.val_losses.push(loss);
        self.val_accuracies.push(accuracy);

        let new_best = accuracy > self.best_val_accuracy;
        if new_best {
            self.best_val_accuracy = accuracy;
        }

        let stop = self.early.observe(loss);

        ValidationOutcome { new_best, stop }
    }

    /// Number of completed epochs
    pub fn epochs_recorded(&self) -> usize {
        self.val_losses.len()
    }

    /// Minimum validation loss seen so far
    pub fn min_val_loss(&self) -> f64 {
        self.early.min_loss()
    }

    /// Consecutive epochs without validation-loss improvement
    pub fn stale_epochs(&self) -> usize {
        self.early.stale_epochs()
    }

    /// Configured early-stopping patience
    pub fn patience(&self) -> usize {
        self.early.patience()
    }
}

/// Result of a completed fit
#[derive(Debug, Clone, Copy)]
pub struct FitOutcome {
    /// Why the loop terminated
    pub reason: StopReason,
    /// Epochs actually run
    pub epochs_run: usize,
    /// Best validation accuracy, matching the restored snapshot
    pub best_accuracy: f64,
}

/// Trainer owning the model, optimizer, schedule, and run state
pub struct Trainer<B: AutodiffBackend> {
    model: Vgg16<B>,
    optimizer: TuneOptimizer<B>,
    schedule: LrSchedule,
    batcher: ImageBatcher<B>,
    valid_batcher: ImageBatcher<B::InnerBackend>,
    state: RunState,
    rng: ChaCha8Rng,
    batch_size: usize,
    epochs: usize,
    optimizer_name: &'static str,
    output_dir: PathBuf,
    persist_charts: bool,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Create a trainer for the given model and configuration
    pub fn new(model: Vgg16<B>, config: &PipelineConfig, device: B::Device) -> Self {
        Self {
            model,
            optimizer: TuneOptimizer::from_choice(&config.optimizer),
            schedule: LrSchedule::from_config(&config.optimizer, &config.schedule),
            batcher: ImageBatcher::new(device.clone()),
            valid_batcher: ImageBatcher::new(device),
            state: RunState::new(config.patience),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            batch_size: config.batch_size,
            epochs: config.epochs,
            optimizer_name: config.optimizer.name(),
            output_dir: config.output_dir.clone(),
            persist_charts: config.persist_charts,
        }
    }

    /// The current model (the best snapshot once `fit` has returned)
    pub fn model(&self) -> &Vgg16<B> {
        &self.model
    }

    /// Consume the trainer, returning the model
    pub fn into_model(self) -> Vgg16<B> {
        self.model
    }

    /// The run state with its per-epoch history
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Run the full training loop.
    ///
    /// One epoch is a training phase followed by a validation phase, strictly
    /// sequential. Terminates on early stop or on budget exhaustion; either
    /// way the curves are rendered for the completed epochs and the model is
    /// restored to the best snapshot before returning.
    pub fn fit(&mut self, splits: &DataSplits) -> Result<FitOutcome> {
        let train_size = splits.size(Split::Train);
        let val_size = splits.size(Split::Val);
        if train_size == 0 || val_size == 0 {
            return Err(TuneError::Training(
                "train and val splits must be non-empty".to_string(),
            ));
        }

        let mut logger = EpochLogger::new(self.epochs);
        let mut best_model: Option<Vgg16<B>> = None;
        println!("Initial learning rate is: {}", self.schedule.lr_at(0));

        for epoch in 0..self.epochs {
            logger.start_epoch(epoch);
            println!(
                "{}",
                format!("Epoch {}/{}", epoch + 1, self.epochs).yellow().bold()
            );
            println!("{}", "-".repeat(10));

            // The schedule advances exactly once per epoch, at the start of
            // the training phase; every batch of the epoch uses this rate.
            let lr = self.schedule.lr_at(epoch);

            let (train_loss, train_acc) =
                self.train_phase(splits.split(Split::Train), train_size, lr)?;
            self.state.record_train(train_loss, train_acc);
            println!("{} Loss: {:.4} Acc: {:.4}", Phase::Training, train_loss, train_acc);
            logger.log_phase("train", train_loss, train_acc);

            let (val_loss, val_acc) = self.valid_phase(splits.split(Split::Val), val_size)?;
            println!("{} Loss: {:.4} Acc: {:.4}", Phase::Validating, val_loss, val_acc);
            logger.log_phase("val", val_loss, val_acc);

            let outcome = self.state.observe_validation(val_loss, val_acc);
            if outcome.new_best {
                best_model = Some(self.model.clone());
                logger.log_new_best(val_acc);
            }
            logger.end_epoch(lr);

            if outcome.stop {
                let stopped_at = epoch + 1;
                println!("Stop early at epoch: {}", stopped_at);
                println!("Best val Acc: {:.4}", self.state.best_val_accuracy);
                logger.log_early_stop(stopped_at, self.state.patience());

                self.render_curves(stopped_at)?;
                if let Some(best) = best_model {
                    self.model = best;
                }
                return Ok(FitOutcome {
                    reason: StopReason::Early { epoch: stopped_at },
                    epochs_run: stopped_at,
                    best_accuracy: self.state.best_val_accuracy,
                });
            }
        }

        println!("Best val Acc: {:.4}", self.state.best_val_accuracy);
        logger.log_complete(self.epochs, self.state.best_val_accuracy);

        self.render_curves(self.epochs)?;
        if let Some(best) = best_model {
            self.model = best;
        }
        Ok(FitOutcome {
            reason: StopReason::Budget,
            epochs_run: self.epochs,
            best_accuracy: self.state.best_val_accuracy,
        })
    }

    /// One pass over the shuffled train split with gradient updates
    fn train_phase(
        &mut self,
        dataset: &FolderDataset,
        split_size: usize,
        lr: f64,
    ) -> Result<(f64, f64)> {
        let mut indices: Vec<usize> = (0..split_size).collect();
        indices.shuffle(&mut self.rng);

        let total_batches = num_batches(split_size, self.batch_size);
        let mut totals = RunningTotals::default();

        for (batch_idx, chunk) in indices.chunks(self.batch_size).enumerate() {
            let items = chunk
                .iter()
                .map(|&i| dataset.try_get(i))
                .collect::<Result<Vec<_>>>()?;
            let batch = self.batcher.batch(items);

            let output = self.model.forward(batch.images);
            let loss = CrossEntropyLossConfig::new()
                .init(&output.device())
                .forward(output.clone(), batch.targets.clone());
            let loss_value: f64 = loss.clone().into_scalar().elem();

            let correct = count_correct(output, batch.targets);
            totals.add_batch(loss_value, chunk.len(), correct);

            // Gradients are computed fresh per batch; one optimizer step each
            let grads = GradientsParams::from_grads(loss.backward(), &self.model);
            self.model = self.optimizer.step(lr, self.model.clone(), grads);

            if (batch_idx + 1) % 10 == 0 || batch_idx + 1 == total_batches {
                debug!(
                    "  Batch {:>4}/{}: loss = {:.4}, acc = {:.2}%",
                    batch_idx + 1,
                    total_batches,
                    loss_value,
                    100.0 * totals.epoch_accuracy(totals.seen.max(1))
                );
            }
        }

        Ok((totals.epoch_loss(split_size), totals.epoch_accuracy(split_size)))
    }

    /// One pass over the shuffled validation split, forward-only
    fn valid_phase(&mut self, dataset: &FolderDataset, split_size: usize) -> Result<(f64, f64)> {
        let mut indices: Vec<usize> = (0..split_size).collect();
        indices.shuffle(&mut self.rng);

        let model = self.model.valid();
        let mut totals = RunningTotals::default();

        for chunk in indices.chunks(self.batch_size) {
            let items = chunk
                .iter()
                .map(|&i| dataset.try_get(i))
                .collect::<Result<Vec<_>>>()?;
            let batch = self.valid_batcher.batch(items);

            let output = model.forward(batch.images);
            let loss = CrossEntropyLossConfig::new()
                .init(&output.device())
                .forward(output.clone(), batch.targets.clone());
            let loss_value: f64 = loss.into_scalar().elem();

            let correct = count_correct(output, batch.targets);
            totals.add_batch(loss_value, chunk.len(), correct);
        }

        Ok((totals.epoch_loss(split_size), totals.epoch_accuracy(split_size)))
    }

    /// Render the loss/accuracy curves for both phases over the completed
    /// epochs, titled by the optimizer actually in use
    fn render_curves(&self, epochs_completed: usize) -> Result<()> {
        let epochs: Vec<usize> = (1..=epochs_completed).collect();

        let train_title = format!("{} Optimizer Train", self.optimizer_name);
        let val_title = format!("{} Optimizer Validation", self.optimizer_name);

        let train_path = charts::draw_curves(
            &epochs,
            &self.state.train_losses,
            &self.state.train_accuracies,
            &train_title,
            &self.output_dir,
            self.persist_charts,
        )?;
        let val_path = charts::draw_curves(
            &epochs,
            &self.state.val_losses,
            &self.state.val_accuracies,
            &val_title,
            &self.output_dir,
            self.persist_charts,
        )?;

        if let (Some(train_path), Some(val_path)) = (train_path, val_path) {
            info!("Curves written to {:?} and {:?}", train_path, val_path);
        }

        Ok(())
    }
}

/// Count exact top-1 matches in one batch of logits
pub fn count_correct<B: Backend>(output: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predictions = output.argmax(1).squeeze::<1>(1);
    let correct: i64 = predictions.equal(targets).int().sum().into_scalar().elem();
    correct as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_early_stopping_triggers_exactly_at_patience() {
        let mut early = EarlyStopping::new(6);

        assert!(!early.observe(1.0)); // improves (below infinity)
        for i in 1..=5 {
            assert!(!early.observe(1.0), "must not stop at stale epoch {}", i);
        }
        // Sixth consecutive stale epoch hits the threshold
        assert!(early.observe(1.0));
        assert_eq!(early.stale_epochs(), 6);
    }

    #[test]
    fn test_early_stopping_resets_on_strict_improvement() {
        let mut early = EarlyStopping::new(3);

        assert!(!early.observe(1.0));
        assert!(!early.observe(1.1)); // stale 1
        assert!(!early.observe(1.0)); // equal to minimum: still stale (2)
        assert_eq!(early.stale_epochs(), 2);

        assert!(!early.observe(0.9)); // strict improvement resets
        assert_eq!(early.stale_epochs(), 0);
        assert_eq!(early.min_loss(), 0.9);

        assert!(!early.observe(0.95));
        assert!(!early.observe(0.95));
        assert!(early.observe(0.95)); // third consecutive stale epoch
    }

    #[test]
    fn test_best_accuracy_is_monotone_upper_bound() {
        let mut state = RunState::new(6);

        let accuracies = [0.3, 0.5, 0.4, 0.7, 0.6];
        for (i, &acc) in accuracies.iter().enumerate() {
            state.observe_validation(1.0 / (i + 1) as f64, acc);
            for &seen in &accuracies[..=i] {
                assert!(state.best_val_accuracy >= seen);
            }
        }
        assert_eq!(state.best_val_accuracy, 0.7);
    }

    #[test]
    fn test_new_best_requires_strict_improvement() {
        let mut state = RunState::new(6);

        assert!(state.observe_validation(1.0, 0.5).new_best);
        assert!(!state.observe_validation(0.9, 0.5).new_best); // tie is not a new best
        assert!(state.observe_validation(0.8, 0.6).new_best);
    }

    #[test]
    fn test_non_improving_run_ends_on_budget_with_first_epoch_best() {
        // Budget 3, patience 3, strictly worsening losses: epoch 1 sets the
        // loss minimum, epochs 2 and 3 are stale (counter reaches 2 < 3), so
        // the run ends on budget with the epoch-1 snapshot as best.
        let mut state = RunState::new(3);
        let losses = [0.9, 0.95, 1.0];
        let accuracies = [0.6, 0.5, 0.4];

        let mut best_epoch = 0usize;
        let mut stopped_at = None;

        for epoch in 0..3 {
            let outcome = state.observe_validation(losses[epoch], accuracies[epoch]);
            if outcome.new_best {
                best_epoch = epoch + 1;
            }
            if outcome.stop {
                stopped_at = Some(epoch + 1);
                break;
            }
        }

        assert_eq!(stopped_at, None, "early stop must not fire before patience");
        assert_eq!(state.epochs_recorded(), 3);
        assert_eq!(best_epoch, 1);
        assert_eq!(state.best_val_accuracy, 0.6);
        assert_eq!(state.min_val_loss(), 0.9);
        assert_eq!(state.stale_epochs(), 2);
    }

    #[test]
    fn test_early_stop_fires_mid_run() {
        let mut state = RunState::new(2);
        let losses = [1.0, 0.8, 0.9, 0.85, 0.95];
        let accuracies = [0.4, 0.6, 0.55, 0.5, 0.45];

        let mut stopped_at = None;
        for epoch in 0..losses.len() {
            let outcome = state.observe_validation(losses[epoch], accuracies[epoch]);
            if outcome.stop {
                stopped_at = Some(epoch + 1);
                break;
            }
        }

        // Epoch 2 improves; epochs 3 and 4 are stale, hitting patience 2
        assert_eq!(stopped_at, Some(4));
        assert_eq!(state.epochs_recorded(), 4);
        assert_eq!(state.best_val_accuracy, 0.6);
    }

    #[test]
    fn test_recorded_metrics_stay_in_bounds() {
        let mut state = RunState::new(6);
        state.record_train(0.7, 0.55);
        state.record_train(0.6, 0.62);
        state.observe_validation(0.8, 0.5);
        state.observe_validation(0.75, 0.58);

        for &loss in state.train_losses.iter().chain(state.val_losses.iter()) {
            assert!(loss >= 0.0);
        }
        for &acc in state
            .train_accuracies
            .iter()
            .chain(state.val_accuracies.iter())
        {
            assert!((0.0..=1.0).contains(&acc));
        }
    }
}
