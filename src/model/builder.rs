//! Model Builder
//!
//! Constructs the VGG-16 classifier for a run: resolves the compute device
//! from the hardware preference, loads pretrained backbone weights when a
//! record file is available, freezes the backbone according to the unfreeze
//! count, and reports the device the model landed on.

use burn::module::Module;
use burn::record::CompactRecorder;
use tracing::{info, warn};

use super::vgg::{Vgg16, Vgg16Config};
use crate::backend::{select_device, DefaultDevice, TrainingBackend};
use crate::config::PipelineConfig;
use crate::utils::error::{Result, TuneError};

/// Build the model on the device resolved from the configured hardware
/// preference.
///
/// The backbone is frozen by default; `config.unfreeze_blocks` conv blocks
/// counted from the output end stay trainable. The fully-connected head is
/// always trainable.
pub fn build(config: &PipelineConfig) -> Result<(Vgg16<TrainingBackend>, DefaultDevice)> {
    let device = select_device(config.hardware);

    let model_config = Vgg16Config::new();
    let mut model = Vgg16::<TrainingBackend>::new(&model_config, &device);

    match &config.pretrained_weights {
        Some(path) if path.exists() => {
            info!("Loading pretrained backbone from {:?}", path);
            let recorder = CompactRecorder::new();
            model.features = model
                .features
                .load_file(path, &recorder, &device)
                .map_err(|e| TuneError::Model(format!("failed to load pretrained backbone: {:?}", e)))?;
        }
        Some(path) => {
            warn!(
                "Pretrained weights not found at {:?}; backbone keeps random initialization",
                path
            );
        }
        None => {
            warn!("No pretrained weights configured; backbone keeps random initialization");
        }
    }

    let model = model.freeze_backbone(config.unfreeze_blocks);

    println!("Created model for {}", config.hardware);
    info!(
        "Model ready: {} parameters, {} trailing conv blocks trainable",
        model.num_params(),
        config.unfreeze_blocks
    );

    Ok((model, device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Hardware;

    #[test]
    fn test_build_without_pretrained_weights() {
        let config = PipelineConfig {
            hardware: Hardware::Cpu,
            pretrained_weights: None,
            ..Default::default()
        };

        let (model, _device) = build(&config).unwrap();
        assert_eq!(model.num_classes(), crate::NUM_CLASSES);
    }

    #[test]
    fn test_build_with_missing_weights_file_falls_back() {
        let config = PipelineConfig {
            hardware: Hardware::Cpu,
            pretrained_weights: Some("does/not/exist.mpk".into()),
            ..Default::default()
        };

        // Missing file is a warning, not an error
        assert!(build(&config).is_ok());
    }
}
