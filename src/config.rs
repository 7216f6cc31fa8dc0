//! Pipeline Configuration Module
//!
//! Defines the immutable configuration passed into every component at
//! construction. Everything the pipeline can tune lives here: hardware
//! preference, backbone freezing, optimizer choice with its hyperparameters,
//! learning-rate schedule, batching, epoch budget, and early stopping.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Compute hardware preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hardware {
    /// General-purpose CPU compute
    Cpu,
    /// GPU or other accelerator, when one is available
    Accelerator,
}

impl Hardware {
    /// Parse from a CLI string
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "accelerator" | "gpu" | "cuda" => Hardware::Accelerator,
            _ => Hardware::Cpu,
        }
    }
}

impl std::fmt::Display for Hardware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hardware::Cpu => write!(f, "cpu"),
            Hardware::Accelerator => write!(f, "accelerator"),
        }
    }
}

/// Optimizer selection, resolved once at startup into a concrete update rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptimizerChoice {
    /// Adam with decoupled L2 weight decay
    Adam { lr: f64, weight_decay: f64 },
    /// Stochastic gradient descent with momentum
    Sgd { lr: f64, momentum: f64 },
    /// RMSProp with a moving-average smoothing constant
    RmsProp { lr: f64, alpha: f64 },
}

impl OptimizerChoice {
    /// Adam with the default fine-tuning hyperparameters
    pub fn adam() -> Self {
        Self::Adam {
            lr: 1e-4,
            weight_decay: 1e-2,
        }
    }

    /// SGD with the default momentum
    pub fn sgd() -> Self {
        Self::Sgd {
            lr: 1e-4,
            momentum: 0.9,
        }
    }

    /// RMSProp with the default smoothing constant
    pub fn rms_prop() -> Self {
        Self::RmsProp {
            lr: 1e-4,
            alpha: 0.9,
        }
    }

    /// Parse an optimizer name with its associated hyperparameters
    pub fn from_args(name: &str, lr: f64, weight_decay: f64, momentum: f64, alpha: f64) -> Self {
        match name.to_lowercase().as_str() {
            "sgd" => Self::Sgd { lr, momentum },
            "rms" | "rmsprop" => Self::RmsProp { lr, alpha },
            _ => Self::Adam { lr, weight_decay },
        }
    }

    /// Initial learning rate of the chosen optimizer
    pub fn learning_rate(&self) -> f64 {
        match self {
            Self::Adam { lr, .. } | Self::Sgd { lr, .. } | Self::RmsProp { lr, .. } => *lr,
        }
    }

    /// Human-readable optimizer name, used for chart titles and logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Adam { .. } => "Adam",
            Self::Sgd { .. } => "SGD",
            Self::RmsProp { .. } => "RMSProp",
        }
    }
}

impl Default for OptimizerChoice {
    fn default() -> Self {
        Self::adam()
    }
}

/// Learning-rate schedule parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Number of epochs between learning-rate decays
    pub step_size: usize,
    /// Multiplicative decay factor applied at each step
    pub gamma: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            step_size: 7,
            gamma: 0.1,
        }
    }
}

/// Immutable configuration for a full fine-tuning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root of the dataset with train/val/test subdirectories
    pub data_dir: PathBuf,

    /// Directory for checkpoints and chart artifacts
    pub output_dir: PathBuf,

    /// Hardware preference for model placement
    pub hardware: Hardware,

    /// Number of trailing backbone conv blocks left trainable (0..=5)
    pub unfreeze_blocks: usize,

    /// Path to pretrained backbone weights; random init when absent
    pub pretrained_weights: Option<PathBuf>,

    /// Optimizer and its hyperparameters
    pub optimizer: OptimizerChoice,

    /// Learning-rate schedule parameters
    pub schedule: ScheduleConfig,

    /// Batch size for all splits
    pub batch_size: usize,

    /// Epoch budget
    pub epochs: usize,

    /// Early-stopping patience: consecutive epochs without validation-loss
    /// improvement before the run stops
    pub patience: usize,

    /// Random seed for epoch shuffling
    pub seed: u64,

    /// Whether loss/accuracy charts are written to disk
    pub persist_charts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/dataset"),
            output_dir: PathBuf::from("output"),
            hardware: Hardware::Accelerator,
            unfreeze_blocks: 0,
            pretrained_weights: Some(PathBuf::from("weights/vgg16_imagenet.mpk")),
            optimizer: OptimizerChoice::adam(),
            schedule: ScheduleConfig::default(),
            batch_size: 32,
            epochs: 25,
            patience: 6,
            seed: 42,
            persist_charts: true,
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".to_string());
        }

        if self.epochs == 0 {
            return Err("epochs must be greater than 0".to_string());
        }

        if self.patience == 0 {
            return Err("patience must be greater than 0".to_string());
        }

        if self.unfreeze_blocks > 5 {
            return Err("unfreeze_blocks must be in 0..=5 (VGG-16 has 5 conv blocks)".to_string());
        }

        if self.schedule.step_size == 0 {
            return Err("schedule step_size must be greater than 0".to_string());
        }

        if self.schedule.gamma <= 0.0 || self.schedule.gamma > 1.0 {
            return Err("schedule gamma must be in (0.0, 1.0]".to_string());
        }

        if self.optimizer.learning_rate() <= 0.0 {
            return Err("learning rate must be positive".to_string());
        }

        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.patience, 6);
        assert_eq!(config.epochs, 25);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PipelineConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        config = PipelineConfig::default();
        config.unfreeze_blocks = 6;
        assert!(config.validate().is_err());

        config = PipelineConfig::default();
        config.schedule.gamma = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_optimizer_from_args() {
        let opt = OptimizerChoice::from_args("sgd", 0.001, 0.01, 0.9, 0.9);
        assert_eq!(
            opt,
            OptimizerChoice::Sgd {
                lr: 0.001,
                momentum: 0.9
            }
        );
        assert_eq!(opt.name(), "SGD");

        let opt = OptimizerChoice::from_args("rms", 0.001, 0.01, 0.9, 0.99);
        assert_eq!(opt.name(), "RMSProp");

        // Unknown names default to Adam, matching the original dispatch
        let opt = OptimizerChoice::from_args("unknown", 0.001, 0.01, 0.9, 0.9);
        assert_eq!(opt.name(), "Adam");
    }

    #[test]
    fn test_hardware_from_str() {
        assert_eq!(Hardware::from_str("gpu"), Hardware::Accelerator);
        assert_eq!(Hardware::from_str("ACCELERATOR"), Hardware::Accelerator);
        assert_eq!(Hardware::from_str("cpu"), Hardware::Cpu);
        assert_eq!(Hardware::from_str("anything"), Hardware::Cpu);
    }
}
