//! Image Transform Pipelines
//!
//! Per-split preprocessing applied before tensor conversion. Training uses a
//! stochastic pipeline (random resized crop plus small color jitter); the
//! validation and test splits use the deterministic resize + center crop so
//! repeated evaluation sees identical pixels.

use image::imageops::FilterType;
use image::DynamicImage;
use rand::Rng;

use crate::{IMAGE_SIZE, RESIZE_SIZE};

/// Maximum brightness shift in 8-bit pixel units (roughly 5%)
const BRIGHTNESS_JITTER: i32 = 13;

/// Maximum contrast adjustment in percent
const CONTRAST_JITTER: f32 = 5.0;

/// Smallest crop area fraction for the random resized crop
const MIN_CROP_SCALE: f64 = 0.6;

/// A split-specific preprocessing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Stochastic training pipeline: random resized crop + color jitter
    Augment,
    /// Deterministic pipeline: resize shortest side, center crop
    Deterministic,
}

impl Transform {
    /// Output edge length in pixels
    pub fn output_size(&self) -> u32 {
        IMAGE_SIZE as u32
    }

    /// Apply the pipeline to a decoded image
    pub fn apply(&self, img: DynamicImage) -> DynamicImage {
        match self {
            Transform::Augment => augment(img),
            Transform::Deterministic => resize_center_crop(img),
        }
    }
}

fn augment(img: DynamicImage) -> DynamicImage {
    let mut rng = rand::thread_rng();

    let img = random_resized_crop(img, IMAGE_SIZE as u32, &mut rng);

    let brightness = rng.gen_range(-BRIGHTNESS_JITTER..=BRIGHTNESS_JITTER);
    let contrast = rng.gen_range(-CONTRAST_JITTER..=CONTRAST_JITTER);
    img.brighten(brightness).adjust_contrast(contrast)
}

/// Crop a random sub-region covering 60-100% of the image area with a mild
/// aspect-ratio perturbation, then rescale to the target size.
fn random_resized_crop(img: DynamicImage, size: u32, rng: &mut impl Rng) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let area = width as f64 * height as f64;

    let scale = rng.gen_range(MIN_CROP_SCALE..=1.0);
    let ratio = rng.gen_range(0.75..=4.0 / 3.0);

    let crop_w = ((area * scale * ratio).sqrt() as u32).clamp(1, width);
    let crop_h = ((area * scale / ratio).sqrt() as u32).clamp(1, height);

    let x = rng.gen_range(0..=width - crop_w);
    let y = rng.gen_range(0..=height - crop_h);

    img.crop_imm(x, y, crop_w, crop_h)
        .resize_exact(size, size, FilterType::Triangle)
}

/// Resize so the shorter side matches `RESIZE_SIZE`, then crop the center
/// `IMAGE_SIZE` square.
fn resize_center_crop(img: DynamicImage) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    let short = width.min(height).max(1);
    let scale = RESIZE_SIZE as f64 / short as f64;

    let new_w = ((width as f64 * scale).round() as u32).max(RESIZE_SIZE as u32);
    let new_h = ((height as f64 * scale).round() as u32).max(RESIZE_SIZE as u32);
    let resized = img.resize_exact(new_w, new_h, FilterType::Triangle);

    let out = IMAGE_SIZE as u32;
    let x = (new_w - out) / 2;
    let y = (new_h - out) / 2;
    resized.crop_imm(x, y, out, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::new_rgb8(width, height)
    }

    #[test]
    fn test_deterministic_output_shape() {
        for (w, h) in [(640, 480), (300, 500), (256, 256), (224, 224)] {
            let out = Transform::Deterministic.apply(test_image(w, h));
            assert_eq!(out.width(), IMAGE_SIZE as u32);
            assert_eq!(out.height(), IMAGE_SIZE as u32);
        }
    }

    #[test]
    fn test_augment_output_shape() {
        let out = Transform::Augment.apply(test_image(500, 375));
        assert_eq!(out.width(), IMAGE_SIZE as u32);
        assert_eq!(out.height(), IMAGE_SIZE as u32);
    }

    #[test]
    fn test_deterministic_is_repeatable() {
        let a = Transform::Deterministic.apply(test_image(400, 300)).to_rgb8();
        let b = Transform::Deterministic.apply(test_image(400, 300)).to_rgb8();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
