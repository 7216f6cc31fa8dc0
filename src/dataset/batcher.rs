//! Burn Dataset and Batcher Integration
//!
//! Implements Burn's Dataset trait over the on-disk samples of one split and
//! a Batcher that assembles normalized image tensors. Images are loaded on
//! demand, pushed through the split's transform pipeline, and normalized with
//! the ImageNet statistics the pretrained backbone expects.

use std::path::PathBuf;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::ImageReader;

use super::transform::Transform;
use crate::utils::error::{Result, TuneError};
use crate::IMAGE_SIZE;

/// ImageNet normalization mean values (RGB)
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Number of batches a split of `n` examples yields at a given batch size
/// (the final batch may be short)
pub fn num_batches(n: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    n.div_ceil(batch_size)
}

/// A single example ready for batching
#[derive(Clone, Debug)]
pub struct ImageItem {
    /// Image data as flattened CHW float array [3 * H * W], range [0, 1]
    pub image: Vec<f32>,
    /// Class label index
    pub label: usize,
    /// Source path (for error reporting)
    pub path: String,
}

impl ImageItem {
    /// Load an image from disk, apply the split transform, and convert to
    /// CHW float data
    pub fn from_path(path: &PathBuf, label: usize, transform: Transform) -> Result<Self> {
        let img = ImageReader::open(path)
            .map_err(|e| TuneError::ImageLoad(path.clone(), e.to_string()))?
            .decode()
            .map_err(|e| TuneError::ImageLoad(path.clone(), e.to_string()))?;

        let img = transform.apply(img).to_rgb8();

        let size = transform.output_size() as usize;
        let mut image = vec![0.0f32; 3 * size * size];

        // CHW layout, scaled to [0, 1]
        for y in 0..size {
            for x in 0..size {
                let pixel = img.get_pixel(x as u32, y as u32);
                image[y * size + x] = pixel[0] as f32 / 255.0;
                image[size * size + y * size + x] = pixel[1] as f32 / 255.0;
                image[2 * size * size + y * size + x] = pixel[2] as f32 / 255.0;
            }
        }

        Ok(Self {
            image,
            label,
            path: path.to_string_lossy().to_string(),
        })
    }

    /// Create from pre-loaded image data
    pub fn from_data(image: Vec<f32>, label: usize, path: String) -> Self {
        Self { image, label, path }
    }
}

/// One split's samples behind Burn's Dataset trait.
///
/// Loading happens lazily per index so only the in-flight batch is resident.
#[derive(Debug, Clone)]
pub struct FolderDataset {
    samples: Vec<(PathBuf, usize)>,
    transform: Transform,
}

impl FolderDataset {
    /// Create a dataset over the given (path, label) samples
    pub fn new(samples: Vec<(PathBuf, usize)>, transform: Transform) -> Self {
        Self { samples, transform }
    }

    /// Load one example, surfacing decode failures as fatal errors with the
    /// offending path. The training loop uses this instead of [`Dataset::get`]
    /// because a corrupt image must terminate the run, not be skipped.
    pub fn try_get(&self, index: usize) -> Result<ImageItem> {
        let (path, label) = self
            .samples
            .get(index)
            .ok_or_else(|| TuneError::Dataset(format!("sample index {} out of range", index)))?;
        ImageItem::from_path(path, *label, self.transform)
    }

    /// The (path, label) samples backing this split
    pub fn samples(&self) -> &[(PathBuf, usize)] {
        &self.samples
    }

    /// Per-class sample counts
    pub fn class_distribution(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; num_classes];
        for (_, label) in &self.samples {
            if *label < num_classes {
                counts[*label] += 1;
            }
        }
        counts
    }
}

impl Dataset<ImageItem> for FolderDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.try_get(index).ok()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// A batch of images for training or evaluation
#[derive(Clone, Debug)]
pub struct ImageBatch<B: Backend> {
    /// Images with shape [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher assembling normalized image tensors on the target device
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    device: B::Device,
    image_size: usize,
}

impl<B: Backend> ImageBatcher<B> {
    /// Create a new batcher for the given device
    pub fn new(device: B::Device) -> Self {
        Self {
            device,
            image_size: IMAGE_SIZE,
        }
    }
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size = items.len();
        let channels = 3;
        let height = self.image_size;
        let width = self.image_size;

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();

        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, channels, height, width]),
            &self.device,
        );

        // ImageNet normalization: (x - mean) / std, broadcast over H and W
        let mean = Tensor::<B, 4>::from_floats(
            TensorData::new(IMAGENET_MEAN.to_vec(), [1, 3, 1, 1]),
            &self.device,
        );
        let std = Tensor::<B, 4>::from_floats(
            TensorData::new(IMAGENET_STD.to_vec(), [1, 3, 1, 1]),
            &self.device,
        );
        let images = (images - mean) / std;

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), &self.device);

        ImageBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;

    #[test]
    fn test_num_batches_is_ceiling() {
        assert_eq!(num_batches(100, 32), 4);
        assert_eq!(num_batches(96, 32), 3);
        assert_eq!(num_batches(1, 32), 1);
        assert_eq!(num_batches(0, 32), 0);
        assert_eq!(num_batches(33, 32), 2);
    }

    #[test]
    fn test_image_item_from_data() {
        let image = vec![0.5f32; 3 * IMAGE_SIZE * IMAGE_SIZE];
        let item = ImageItem::from_data(image, 7, "test.jpg".to_string());

        assert_eq!(item.label, 7);
        assert_eq!(item.image.len(), 3 * IMAGE_SIZE * IMAGE_SIZE);
    }

    #[test]
    fn test_folder_dataset_len_and_bounds() {
        let samples = vec![
            (PathBuf::from("a.jpg"), 0),
            (PathBuf::from("b.jpg"), 1),
            (PathBuf::from("c.jpg"), 1),
        ];
        let dataset = FolderDataset::new(samples, Transform::Deterministic);

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.class_distribution(2), vec![1, 2]);
        assert!(dataset.try_get(3).is_err());
    }

    #[test]
    fn test_batch_shapes() {
        let items: Vec<ImageItem> = (0..4)
            .map(|i| {
                ImageItem::from_data(
                    vec![0.5f32; 3 * IMAGE_SIZE * IMAGE_SIZE],
                    i % 2,
                    format!("{}.jpg", i),
                )
            })
            .collect();

        let batcher = ImageBatcher::<DefaultBackend>::new(Default::default());
        let batch = batcher.batch(items);

        assert_eq!(batch.images.dims(), [4, 3, IMAGE_SIZE, IMAGE_SIZE]);
        assert_eq!(batch.targets.dims(), [4]);
    }
}
