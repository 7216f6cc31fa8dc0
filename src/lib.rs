//! # vggtune
//!
//! A Rust pipeline for fine-tuning a pretrained VGG-16 image classifier on a
//! custom labeled dataset using the Burn framework.
//!
//! The pipeline covers the whole transfer-learning flow: build the model
//! (frozen convolutional backbone + fresh fully-connected head), load the
//! `train`/`val`/`test` splits from a directory-per-class layout, train with
//! validation-based model selection and loss-based early stopping, evaluate
//! top-1/top-5 accuracy on the held-out test split, and persist the best
//! checkpoint.
//!
//! ## Modules
//!
//! - `dataset`: split loading, augmentation, and batching
//! - `model`: VGG-16 architecture and model construction
//! - `training`: training loop, optimizer selection, LR scheduling, evaluation
//! - `utils`: logging, errors, metrics, and chart rendering
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vggtune::config::PipelineConfig;
//! use vggtune::dataset::DataSplits;
//! use vggtune::model::builder;
//!
//! let config = PipelineConfig::default();
//! let (model, device) = builder::build(&config)?;
//! let splits = DataSplits::load(&config.data_dir)?;
//! // ... training and evaluation
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{Hardware, OptimizerChoice, PipelineConfig, ScheduleConfig};
pub use dataset::loader::{DataSplits, DatasetStats};
pub use dataset::{FolderDataset, ImageBatch, ImageBatcher, ImageItem, Split};
pub use model::builder::build;
pub use model::vgg::{Vgg16, Vgg16Config};
pub use training::evaluate::evaluate;
pub use training::scheduler::LrSchedule;
pub use training::trainer::{FitOutcome, RunState, StopReason, Trainer};
pub use utils::error::{Result, TuneError};
pub use utils::metrics::EvalReport;

/// Number of output classes, fixed by the classifier head architecture
pub const NUM_CLASSES: usize = 24;

/// Input image size expected by the VGG-16 backbone
pub const IMAGE_SIZE: usize = 224;

/// Shorter side length images are resized to before center cropping
pub const RESIZE_SIZE: usize = 256;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
