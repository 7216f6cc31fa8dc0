//! Training module
//!
//! This module provides:
//! - The epoch/phase training loop with best-snapshot tracking and
//!   loss-based early stopping
//! - Optimizer resolution from the configured tagged variant
//! - Epoch-indexed learning-rate scheduling
//! - Held-out test-split evaluation (top-1 / top-5)
//!
//! ## Run control
//!
//! Each epoch runs a training phase then a validation phase. Validation
//! accuracy selects the weight snapshot that is ultimately returned;
//! validation loss drives early stopping. The loop terminates either when
//! the loss has been stale for `patience` consecutive epochs or when the
//! epoch budget runs out, and restores the best snapshot in both cases.

pub mod evaluate;
pub mod optimizer;
pub mod scheduler;
pub mod trainer;

// Re-export main types for convenience
pub use evaluate::evaluate as evaluate_test_split;
pub use optimizer::TuneOptimizer;
pub use scheduler::LrSchedule;
pub use trainer::{
    count_correct, EarlyStopping, FitOutcome, Phase, RunState, StopReason, Trainer,
    ValidationOutcome,
};

/// Default epoch budget
pub const DEFAULT_EPOCHS: usize = 25;

/// Default batch size
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Default early-stopping patience
pub const DEFAULT_PATIENCE: usize = 6;
