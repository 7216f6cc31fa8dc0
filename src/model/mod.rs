//! Model module for the VGG-16 classifier using the Burn framework
//!
//! This module provides:
//! - The VGG-16 backbone and fully-connected classifier head
//! - Model construction with selective backbone freezing
//! - Pretrained weight loading and device placement

pub mod builder;
pub mod vgg;

// Re-export main types for convenience
pub use builder::build;
pub use vgg::{Vgg16, Vgg16Config};

/// Number of convolutional blocks in the VGG-16 backbone
pub const NUM_CONV_BLOCKS: usize = 5;
