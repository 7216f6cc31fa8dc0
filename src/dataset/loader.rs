//! Dataset Loader
//!
//! Loads the train/val/test splits from a directory-per-class layout under a
//! single dataset root. The class list is derived from the train split and
//! shared across all three splits so label indices stay consistent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use super::batcher::FolderDataset;
use super::transform::Transform;
use super::{is_image_path, Split};
use crate::utils::error::{Result, TuneError};

/// The three dataset splits with their class vocabulary
#[derive(Debug, Clone)]
pub struct DataSplits {
    /// Sorted class names; index order defines the label indices
    pub classes: Vec<String>,
    train: FolderDataset,
    val: FolderDataset,
    test: FolderDataset,
}

impl DataSplits {
    /// Load all three splits from `root_dir/{train,val,test}/<class>/<images>`.
    ///
    /// Every split directory must exist; a missing one fails the whole load.
    /// The train split gets the stochastic augmentation pipeline, val and
    /// test the deterministic one.
    pub fn load<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref();
        info!("Loading dataset from: {:?}", root_dir);

        for split in Split::ALL {
            let dir = root_dir.join(split.dir_name());
            if !dir.is_dir() {
                return Err(TuneError::MissingSplit {
                    split: split.dir_name(),
                    root: root_dir.to_path_buf(),
                });
            }
        }

        let classes = discover_classes(&root_dir.join(Split::Train.dir_name()))?;
        if classes.is_empty() {
            return Err(TuneError::Dataset(format!(
                "no class directories found under {:?}",
                root_dir.join("train")
            )));
        }
        info!("Found {} classes", classes.len());

        let class_to_idx: HashMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();

        let train = load_split(root_dir, Split::Train, &class_to_idx)?;
        let val = load_split(root_dir, Split::Val, &class_to_idx)?;
        let test = load_split(root_dir, Split::Test, &class_to_idx)?;

        Ok(Self {
            classes,
            train,
            val,
            test,
        })
    }

    /// The dataset of one split
    pub fn split(&self, split: Split) -> &FolderDataset {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    /// Example count of one split
    pub fn size(&self, split: Split) -> usize {
        self.split(split).samples().len()
    }

    /// Number of classes in the vocabulary
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Aggregate statistics over all splits
    pub fn stats(&self) -> DatasetStats {
        let num_classes = self.num_classes();
        let mut class_counts = vec![0usize; num_classes];
        let mut split_sizes = Vec::with_capacity(3);

        for split in Split::ALL {
            let dataset = self.split(split);
            split_sizes.push((split, dataset.samples().len()));
            for (_, label) in dataset.samples() {
                if *label < num_classes {
                    class_counts[*label] += 1;
                }
            }
        }

        DatasetStats {
            class_names: self.classes.clone(),
            class_counts,
            split_sizes,
        }
    }
}

/// Discover class subdirectories of the train split, sorted by name
fn discover_classes(train_dir: &Path) -> Result<Vec<String>> {
    let mut classes: Vec<String> = Vec::new();
    for entry in std::fs::read_dir(train_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                classes.push(name.to_string());
            }
        }
    }
    classes.sort();
    Ok(classes)
}

/// Scan one split and wrap it with its transform pipeline
fn load_split(
    root_dir: &Path,
    split: Split,
    class_to_idx: &HashMap<&str, usize>,
) -> Result<FolderDataset> {
    let samples = scan_split(root_dir, split, class_to_idx)?;
    println!("{} images loaded for {}", samples.len(), split);

    let transform = match split {
        Split::Train => Transform::Augment,
        Split::Val | Split::Test => Transform::Deterministic,
    };
    Ok(FolderDataset::new(samples, transform))
}

/// Collect (path, label) samples of one split, skipping class directories
/// absent from the shared vocabulary
fn scan_split(
    root_dir: &Path,
    split: Split,
    class_to_idx: &HashMap<&str, usize>,
) -> Result<Vec<(PathBuf, usize)>> {
    let split_dir = root_dir.join(split.dir_name());
    let mut samples = Vec::new();

    let mut class_dirs: Vec<PathBuf> = std::fs::read_dir(&split_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    class_dirs.sort();

    for class_dir in class_dirs {
        let Some(class_name) = class_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(&label) = class_to_idx.get(class_name) else {
            debug!(
                "Class '{}' in {} split is not in the train vocabulary; skipping",
                class_name, split
            );
            continue;
        };

        let mut paths: Vec<PathBuf> = WalkDir::new(&class_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .filter(|p| is_image_path(p))
            .collect();
        paths.sort();

        debug!("{} split, class '{}': {} images", split, class_name, paths.len());
        samples.extend(paths.into_iter().map(|p| (p, label)));
    }

    Ok(samples)
}

/// Statistics about the loaded dataset
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub class_names: Vec<String>,
    pub class_counts: Vec<usize>,
    pub split_sizes: Vec<(Split, usize)>,
}

impl DatasetStats {
    /// Total samples across all splits
    pub fn total_samples(&self) -> usize {
        self.split_sizes.iter().map(|(_, n)| n).sum()
    }

    /// Print statistics to console
    pub fn print(&self) {
        let total = self.total_samples().max(1);

        println!("\nDataset statistics:");
        for (split, size) in &self.split_sizes {
            println!("  {:5}: {:6} images", split.dir_name(), size);
        }
        println!("  Classes: {}", self.class_names.len());
        println!("\n  Samples per class:");

        for (idx, name) in self.class_names.iter().enumerate() {
            let count = self.class_counts[idx];
            let bar_len = (count as f32 / total as f32 * 40.0) as usize;
            let bar: String = "█".repeat(bar_len);
            println!("    {:3}. {:40} {:5} {}", idx, name, count, bar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Build a tiny on-disk dataset with `n` 1x1 PNGs per class per split
    fn write_dataset(root: &Path, classes: &[&str], n: usize) {
        let png = image::RgbImage::new(8, 8);
        for split in ["train", "val", "test"] {
            for class in classes {
                let dir = root.join(split).join(class);
                fs::create_dir_all(&dir).unwrap();
                for i in 0..n {
                    png.save(dir.join(format!("img_{}.png", i))).unwrap();
                }
            }
        }
    }

    #[test]
    fn test_load_counts_per_split() {
        let root = std::env::temp_dir().join("vggtune_loader_counts");
        let _ = fs::remove_dir_all(&root);
        write_dataset(&root, &["ant", "bee"], 3);

        let splits = DataSplits::load(&root).unwrap();
        assert_eq!(splits.num_classes(), 2);
        for split in Split::ALL {
            assert_eq!(splits.size(split), 6);
        }

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_missing_split_is_fatal() {
        let root = std::env::temp_dir().join("vggtune_loader_missing");
        let _ = fs::remove_dir_all(&root);
        write_dataset(&root, &["ant"], 1);
        fs::remove_dir_all(root.join("val")).unwrap();

        let err = DataSplits::load(&root).unwrap_err();
        assert!(matches!(
            err,
            TuneError::MissingSplit { split: "val", .. }
        ));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_class_labels_follow_sorted_order() {
        let root = std::env::temp_dir().join("vggtune_loader_order");
        let _ = fs::remove_dir_all(&root);
        write_dataset(&root, &["zebra", "ant"], 1);

        let splits = DataSplits::load(&root).unwrap();
        assert_eq!(splits.classes, vec!["ant".to_string(), "zebra".to_string()]);

        let samples = splits.split(Split::Train).samples();
        let ant_label = samples
            .iter()
            .find(|(p, _)| p.to_string_lossy().contains("ant"))
            .map(|(_, l)| *l)
            .unwrap();
        assert_eq!(ant_label, 0);

        let _ = fs::remove_dir_all(&root);
    }
}
