//! VGG-16 Architecture
//!
//! Implements the VGG-16 convolutional backbone and the fully-connected
//! classifier head used for fine-tuning. The backbone is the standard five
//! conv-block stack (64/128/256/512/512 channels); the head replaces the
//! original 1000-way classifier with a fresh three-layer block sized for the
//! target dataset.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

use super::NUM_CONV_BLOCKS;

/// Flattened feature dimension after the backbone: 512 channels at 7x7
pub const FEATURE_DIM: usize = 512 * 7 * 7;

/// Configuration for the VGG-16 classifier
#[derive(Config, Debug)]
pub struct Vgg16Config {
    /// Number of output classes
    #[config(default = "24")]
    pub num_classes: usize,

    /// Hidden width of the two fully-connected layers
    #[config(default = "4096")]
    pub hidden_units: usize,

    /// Dropout rate between the head's hidden layers
    #[config(default = "0.5")]
    pub dropout_rate: f64,
}

/// One VGG block: a run of 3x3 same-padded convolutions followed by 2x2
/// max-pooling
#[derive(Module, Debug)]
pub struct VggBlock<B: Backend> {
    convs: Vec<Conv2d<B>>,
    pool: MaxPool2d,
    activation: Relu,
}

impl<B: Backend> VggBlock<B> {
    /// Create a block of `depth` convolutions from `in_channels` to
    /// `out_channels`
    pub fn new(in_channels: usize, out_channels: usize, depth: usize, device: &B::Device) -> Self {
        let convs = (0..depth)
            .map(|i| {
                let input = if i == 0 { in_channels } else { out_channels };
                Conv2dConfig::new([input, out_channels], [3, 3])
                    .with_padding(PaddingConfig2d::Explicit(1, 1))
                    .init(device)
            })
            .collect();

        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        Self {
            convs,
            pool,
            activation: Relu::new(),
        }
    }

    /// Forward pass through the block
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = x;
        for conv in &self.convs {
            x = self.activation.forward(conv.forward(x));
        }
        self.pool.forward(x)
    }
}

/// The VGG-16 feature extractor: five conv blocks halving the spatial size
/// each, 224 -> 7
#[derive(Module, Debug)]
pub struct Vgg16Features<B: Backend> {
    pub block1: VggBlock<B>,
    pub block2: VggBlock<B>,
    pub block3: VggBlock<B>,
    pub block4: VggBlock<B>,
    pub block5: VggBlock<B>,
}

impl<B: Backend> Vgg16Features<B> {
    /// Create the backbone with freshly initialized weights
    pub fn new(device: &B::Device) -> Self {
        Self {
            block1: VggBlock::new(3, 64, 2, device),
            block2: VggBlock::new(64, 128, 2, device),
            block3: VggBlock::new(128, 256, 3, device),
            block4: VggBlock::new(256, 512, 3, device),
            block5: VggBlock::new(512, 512, 3, device),
        }
    }

    /// Forward pass through all blocks
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.block1.forward(x);
        let x = self.block2.forward(x);
        let x = self.block3.forward(x);
        let x = self.block4.forward(x);
        self.block5.forward(x)
    }

    /// Mark all blocks except the last `unfreeze_blocks` as non-trainable.
    ///
    /// Frozen parameters stop tracking gradients, so optimizer steps leave
    /// them untouched. `unfreeze_blocks == 0` freezes the whole backbone.
    pub fn freeze(mut self, unfreeze_blocks: usize) -> Self {
        let frozen = NUM_CONV_BLOCKS.saturating_sub(unfreeze_blocks);

        if frozen > 0 {
            self.block1 = self.block1.no_grad();
        }
        if frozen > 1 {
            self.block2 = self.block2.no_grad();
        }
        if frozen > 2 {
            self.block3 = self.block3.no_grad();
        }
        if frozen > 3 {
            self.block4 = self.block4.no_grad();
        }
        if frozen > 4 {
            self.block5 = self.block5.no_grad();
        }

        self
    }
}

/// The replacement classifier head: 25088 -> 4096 -> 4096 -> num_classes with
/// ReLU and dropout between the hidden layers
#[derive(Module, Debug)]
pub struct ClassifierHead<B: Backend> {
    fc1: Linear<B>,
    dropout1: Dropout,
    fc2: Linear<B>,
    dropout2: Dropout,
    fc3: Linear<B>,
    activation: Relu,
}

impl<B: Backend> ClassifierHead<B> {
    /// Create a head with freshly initialized, trainable weights
    pub fn new(config: &Vgg16Config, device: &B::Device) -> Self {
        Self {
            fc1: LinearConfig::new(FEATURE_DIM, config.hidden_units).init(device),
            dropout1: DropoutConfig::new(config.dropout_rate).init(),
            fc2: LinearConfig::new(config.hidden_units, config.hidden_units).init(device),
            dropout2: DropoutConfig::new(config.dropout_rate).init(),
            fc3: LinearConfig::new(config.hidden_units, config.num_classes).init(device),
            activation: Relu::new(),
        }
    }

    /// Forward pass from flattened features to class logits
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.dropout1.forward(x);
        let x = self.activation.forward(self.fc2.forward(x));
        let x = self.dropout2.forward(x);
        self.fc3.forward(x)
    }
}

/// VGG-16 classifier: pretrained feature extractor + fresh head
#[derive(Module, Debug)]
pub struct Vgg16<B: Backend> {
    pub features: Vgg16Features<B>,
    pub head: ClassifierHead<B>,
    num_classes: usize,
}

impl<B: Backend> Vgg16<B> {
    /// Create the full model from configuration
    pub fn new(config: &Vgg16Config, device: &B::Device) -> Self {
        Self {
            features: Vgg16Features::new(device),
            head: ClassifierHead::new(config, device),
            num_classes: config.num_classes,
        }
    }

    /// Forward pass from images to class logits
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, 3, 224, 224]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.features.forward(x);

        // Flatten: [B, 512, 7, 7] -> [B, 25088]
        let [batch_size, channels, height, width] = x.dims();
        let x = x.reshape([batch_size, channels * height * width]);

        self.head.forward(x)
    }

    /// Forward pass with softmax for probability outputs
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Freeze the backbone, keeping the last `unfreeze_blocks` conv blocks
    /// trainable. The head is always trainable.
    pub fn freeze_backbone(mut self, unfreeze_blocks: usize) -> Self {
        self.features = self.features.freeze(unfreeze_blocks);
        self
    }

    /// Get the number of output classes
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    type TestBackend = DefaultBackend;

    #[test]
    fn test_head_output_shape() {
        let device = Default::default();
        let config = Vgg16Config::new();
        let head = ClassifierHead::<TestBackend>::new(&config, &device);

        let input = Tensor::<TestBackend, 2>::zeros([2, FEATURE_DIM], &device);
        let output = head.forward(input);

        assert_eq!(output.dims(), [2, 24]);
    }

    #[test]
    fn test_features_downsample_by_32() {
        let device = Default::default();
        let features = Vgg16Features::<TestBackend>::new(&device);

        // 64 -> 2 after five 2x2 pools
        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 64, 64], &device);
        let output = features.forward(input);

        assert_eq!(output.dims(), [1, 512, 2, 2]);
    }

    #[test]
    fn test_frozen_backbone_still_forwards() {
        let device = Default::default();
        let features = Vgg16Features::<TestBackend>::new(&device).freeze(0);

        let input = Tensor::<TestBackend, 4>::zeros([1, 3, 32, 32], &device);
        let output = features.forward(input);

        assert_eq!(output.dims(), [1, 512, 1, 1]);
    }

    #[test]
    fn test_feature_dim_matches_head_input() {
        assert_eq!(FEATURE_DIM, 512 * 7 * 7);
    }
}
