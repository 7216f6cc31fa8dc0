//! Optimizer Resolution
//!
//! Resolves the tagged optimizer choice into a concrete Burn optimizer once
//! at startup. All three variants sit behind the same "apply one step"
//! surface so the training loop never branches on the optimizer kind again.

use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::momentum::MomentumConfig;
use burn::optim::{
    Adam, AdamConfig, GradientsParams, Optimizer, RmsProp, RmsPropConfig, Sgd, SgdConfig,
};
use burn::tensor::backend::AutodiffBackend;

use crate::config::OptimizerChoice;
use crate::model::vgg::Vgg16;

/// A concrete optimizer for the VGG-16 model, resolved from [`OptimizerChoice`]
pub enum TuneOptimizer<B: AutodiffBackend> {
    Adam(OptimizerAdaptor<Adam<B::InnerBackend>, Vgg16<B>, B>),
    Sgd(OptimizerAdaptor<Sgd<B::InnerBackend>, Vgg16<B>, B>),
    RmsProp(OptimizerAdaptor<RmsProp<B::InnerBackend>, Vgg16<B>, B>),
}

impl<B: AutodiffBackend> TuneOptimizer<B> {
    /// Resolve the configured choice into a concrete update rule
    pub fn from_choice(choice: &OptimizerChoice) -> Self {
        match *choice {
            OptimizerChoice::Adam { weight_decay, .. } => Self::Adam(
                AdamConfig::new()
                    .with_weight_decay(Some(WeightDecayConfig::new(weight_decay as f64)))
                    .init(),
            ),
            OptimizerChoice::Sgd { momentum, .. } => Self::Sgd(
                SgdConfig::new()
                    .with_momentum(Some(MomentumConfig::new().with_momentum(momentum)))
                    .init(),
            ),
            OptimizerChoice::RmsProp { alpha, .. } => Self::RmsProp(
                RmsPropConfig::new().with_alpha(alpha as f32).init(),
            ),
        }
    }

    /// Apply one optimizer step at the given learning rate
    pub fn step(&mut self, lr: f64, model: Vgg16<B>, grads: GradientsParams) -> Vgg16<B> {
        match self {
            Self::Adam(optimizer) => optimizer.step(lr, model, grads),
            Self::Sgd(optimizer) => optimizer.step(lr, model, grads),
            Self::RmsProp(optimizer) => optimizer.step(lr, model, grads),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TrainingBackend;

    #[test]
    fn test_each_choice_resolves() {
        let _ = TuneOptimizer::<TrainingBackend>::from_choice(&OptimizerChoice::adam());
        let _ = TuneOptimizer::<TrainingBackend>::from_choice(&OptimizerChoice::sgd());
        let _ = TuneOptimizer::<TrainingBackend>::from_choice(&OptimizerChoice::rms_prop());
    }
}
