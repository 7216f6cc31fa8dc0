//! Test-Split Evaluator
//!
//! Runs the held-out test split once through the trained model, counting
//! exact top-1 matches and top-5 hits. Forward passes only: the model is
//! never mutated, so repeated evaluation on fixed data is idempotent.

use burn::data::dataloader::batcher::Batcher;
use burn::module::AutodiffModule;
use burn::tensor::activation::softmax;
use burn::tensor::backend::AutodiffBackend;
use tracing::info;

use crate::dataset::batcher::ImageBatcher;
use crate::dataset::loader::DataSplits;
use crate::dataset::Split;
use crate::model::vgg::Vgg16;
use crate::utils::error::Result;
use crate::utils::metrics::{count_top_hits, EvalReport};

/// Evaluate top-1 and top-5 accuracy on the test split.
///
/// Accuracies are fractions of the split size. Emits both to the console and
/// the log.
pub fn evaluate<B: AutodiffBackend>(
    model: &Vgg16<B>,
    splits: &DataSplits,
    device: &B::Device,
    batch_size: usize,
) -> Result<EvalReport> {
    let dataset = splits.split(Split::Test);
    let split_size = splits.size(Split::Test);
    let num_classes = model.num_classes();

    let model = model.valid();
    let batcher = ImageBatcher::<B::InnerBackend>::new(device.clone());

    let mut top1_hits = 0usize;
    let mut top5_hits = 0usize;

    for start in (0..split_size).step_by(batch_size.max(1)) {
        let end = (start + batch_size).min(split_size);
        let items = (start..end)
            .map(|i| dataset.try_get(i))
            .collect::<Result<Vec<_>>>()?;
        let batch = batcher.batch(items);

        let logits = model.forward(batch.images);
        let probs = softmax(logits, 1);

        let scores: Vec<f32> = probs.into_data().to_vec().unwrap();
        let labels: Vec<i64> = batch.targets.into_data().to_vec().unwrap();

        let (batch_top1, batch_top5) = count_top_hits(&scores, &labels, num_classes);
        top1_hits += batch_top1;
        top5_hits += batch_top5;
    }

    let report = EvalReport {
        top1: if split_size > 0 {
            top1_hits as f64 / split_size as f64
        } else {
            0.0
        },
        top5: if split_size > 0 {
            top5_hits as f64 / split_size as f64
        } else {
            0.0
        },
        samples: split_size,
    };

    println!("Test Model Acc: {:.4}", report.top1);
    println!("Test Model Top-5 Acc: {:.4}", report.top5);
    info!(
        "Test evaluation: top-1 = {:.2}%, top-5 = {:.2}%, samples = {}",
        report.top1 * 100.0,
        report.top5 * 100.0,
        report.samples
    );

    Ok(report)
}
