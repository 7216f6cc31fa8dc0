//! Learning Rate Scheduler Module
//!
//! Epoch-indexed learning-rate schedules. A schedule is a pure function of
//! the epoch number; the training loop reads it exactly once per epoch, at
//! the start of the training phase.

use serde::{Deserialize, Serialize};

use crate::config::{OptimizerChoice, ScheduleConfig};

/// Learning rate schedule evaluated once per epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LrSchedule {
    /// Constant learning rate (no scheduling)
    Constant { lr: f64 },

    /// Step decay: multiply by `gamma` every `step_size` epochs
    StepDecay {
        initial_lr: f64,
        step_size: usize,
        gamma: f64,
    },
}

impl LrSchedule {
    /// Create a constant schedule
    pub fn constant(lr: f64) -> Self {
        Self::Constant { lr }
    }

    /// Create a step-decay schedule
    pub fn step_decay(initial_lr: f64, step_size: usize, gamma: f64) -> Self {
        Self::StepDecay {
            initial_lr,
            step_size,
            gamma,
        }
    }

    /// Build the schedule an optimizer choice and schedule config imply
    pub fn from_config(optimizer: &OptimizerChoice, schedule: &ScheduleConfig) -> Self {
        Self::step_decay(optimizer.learning_rate(), schedule.step_size, schedule.gamma)
    }

    /// Learning rate for a given epoch (0-indexed)
    pub fn lr_at(&self, epoch: usize) -> f64 {
        match self {
            Self::Constant { lr } => *lr,

            Self::StepDecay {
                initial_lr,
                step_size,
                gamma,
            } => {
                let num_decays = epoch / (*step_size).max(1);
                initial_lr * gamma.powi(num_decays as i32)
            }
        }
    }

    /// Get a description of the schedule
    pub fn description(&self) -> String {
        match self {
            Self::Constant { lr } => format!("Constant LR: {:.6}", lr),
            Self::StepDecay {
                initial_lr,
                step_size,
                gamma,
            } => format!(
                "Step Decay: initial={:.6}, step_size={}, gamma={}",
                initial_lr, step_size, gamma
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_schedule() {
        let schedule = LrSchedule::constant(0.001);
        assert_eq!(schedule.lr_at(0), 0.001);
        assert_eq!(schedule.lr_at(50), 0.001);
    }

    #[test]
    fn test_step_decay_schedule() {
        let schedule = LrSchedule::step_decay(0.1, 7, 0.1);

        assert_eq!(schedule.lr_at(0), 0.1);
        assert_eq!(schedule.lr_at(6), 0.1);
        assert!((schedule.lr_at(7) - 0.01).abs() < 1e-12);
        assert!((schedule.lr_at(13) - 0.01).abs() < 1e-12);
        assert!((schedule.lr_at(14) - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_from_config_uses_optimizer_lr() {
        let optimizer = OptimizerChoice::Adam {
            lr: 1e-4,
            weight_decay: 1e-2,
        };
        let schedule = LrSchedule::from_config(&optimizer, &ScheduleConfig::default());

        assert_eq!(schedule.lr_at(0), 1e-4);
        assert!((schedule.lr_at(7) - 1e-5).abs() < 1e-18);
    }
}
