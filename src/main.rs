//! vggtune CLI
//!
//! Entry point for the VGG-16 fine-tuning pipeline: train on a labeled
//! image dataset, evaluate a saved checkpoint, or inspect dataset statistics.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use burn::module::Module;
use burn::record::CompactRecorder;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use vggtune::backend::{backend_name, select_device, TrainingBackend};
use vggtune::config::{Hardware, OptimizerChoice, PipelineConfig, ScheduleConfig};
use vggtune::dataset::loader::DataSplits;
use vggtune::model::builder;
use vggtune::model::vgg::{Vgg16, Vgg16Config};
use vggtune::training::evaluate::evaluate;
use vggtune::training::trainer::Trainer;
use vggtune::utils::logging::{init_logging, LogConfig};

/// VGG-16 Transfer-Learning Fine-Tuning
///
/// Fine-tunes a pretrained VGG-16 classifier on a custom labeled image
/// dataset using the Burn framework, with validation-based model selection
/// and loss-based early stopping.
#[derive(Parser, Debug)]
#[command(name = "vggtune")]
#[command(version = "0.1.0")]
#[command(about = "Fine-tune a pretrained VGG-16 image classifier", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full fine-tuning pipeline: train, evaluate, save
    Train {
        /// Dataset root with train/val/test subdirectories
        #[arg(short, long, default_value = "data/dataset")]
        data_dir: String,

        /// Output directory for checkpoints and charts
        #[arg(short, long, default_value = "output")]
        output_dir: String,

        /// Hardware preference: cpu or accelerator
        #[arg(long, default_value = "accelerator")]
        hardware: String,

        /// Number of trailing backbone conv blocks to leave trainable (0-5)
        #[arg(long, default_value = "0")]
        unfreeze: usize,

        /// Path to pretrained backbone weights (Burn record)
        #[arg(long, default_value = "weights/vgg16_imagenet.mpk")]
        pretrained: String,

        /// Optimizer: adam, sgd, or rms
        #[arg(long, default_value = "adam")]
        optimizer: String,

        /// Learning rate
        #[arg(short, long, default_value = "0.0001")]
        learning_rate: f64,

        /// Weight decay (adam)
        #[arg(long, default_value = "0.01")]
        weight_decay: f64,

        /// Momentum (sgd)
        #[arg(long, default_value = "0.9")]
        momentum: f64,

        /// Smoothing constant (rms)
        #[arg(long, default_value = "0.9")]
        alpha: f64,

        /// Scheduler step size in epochs
        #[arg(long, default_value = "7")]
        step_size: usize,

        /// Scheduler decay factor
        #[arg(long, default_value = "0.1")]
        gamma: f64,

        /// Batch size for all splits
        #[arg(short, long, default_value = "32")]
        batch_size: usize,

        /// Epoch budget
        #[arg(short, long, default_value = "25")]
        epochs: usize,

        /// Early-stopping patience in epochs
        #[arg(long, default_value = "6")]
        patience: usize,

        /// Random seed for epoch shuffling
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Skip writing chart files
        #[arg(long, default_value = "false")]
        no_charts: bool,
    },

    /// Evaluate a saved checkpoint on the test split
    Evaluate {
        /// Path to the saved model checkpoint
        #[arg(short, long)]
        model: String,

        /// Dataset root with train/val/test subdirectories
        #[arg(short, long, default_value = "data/dataset")]
        data_dir: String,

        /// Hardware preference: cpu or accelerator
        #[arg(long, default_value = "accelerator")]
        hardware: String,

        /// Batch size
        #[arg(short, long, default_value = "32")]
        batch_size: usize,
    },

    /// Show dataset statistics
    Stats {
        /// Dataset root with train/val/test subdirectories
        #[arg(short, long, default_value = "data/dataset")]
        data_dir: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            data_dir,
            output_dir,
            hardware,
            unfreeze,
            pretrained,
            optimizer,
            learning_rate,
            weight_decay,
            momentum,
            alpha,
            step_size,
            gamma,
            batch_size,
            epochs,
            patience,
            seed,
            no_charts,
        } => {
            let config = PipelineConfig {
                data_dir: PathBuf::from(data_dir),
                output_dir: PathBuf::from(output_dir),
                hardware: Hardware::from_str(&hardware),
                unfreeze_blocks: unfreeze,
                pretrained_weights: Some(PathBuf::from(pretrained)),
                optimizer: OptimizerChoice::from_args(
                    &optimizer,
                    learning_rate,
                    weight_decay,
                    momentum,
                    alpha,
                ),
                schedule: ScheduleConfig { step_size, gamma },
                batch_size,
                epochs,
                patience,
                seed,
                persist_charts: !no_charts,
            };
            config.validate().map_err(|e| anyhow::anyhow!(e))?;

            cmd_train(config)?;
        }

        Commands::Evaluate {
            model,
            data_dir,
            hardware,
            batch_size,
        } => {
            cmd_evaluate(
                &model,
                &PathBuf::from(data_dir),
                Hardware::from_str(&hardware),
                batch_size,
            )?;
        }

        Commands::Stats { data_dir } => {
            cmd_stats(&PathBuf::from(data_dir))?;
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        "vggtune — VGG-16 transfer-learning fine-tuning with Burn".green().bold()
    );
    println!();
}

fn cmd_train(config: PipelineConfig) -> Result<()> {
    let started = Instant::now();

    println!("{}", "Training Configuration:".cyan().bold());
    println!("  Dataset:     {:?}", config.data_dir);
    println!("  Optimizer:   {}", config.optimizer.name());
    println!("  Batch size:  {}", config.batch_size);
    println!("  Epochs:      {}", config.epochs);
    println!("  Patience:    {}", config.patience);
    println!("  Unfrozen:    {} conv blocks", config.unfreeze_blocks);
    println!("  Backend:     {}", backend_name());
    println!();

    let (model, device) = builder::build(&config)?;
    let splits = DataSplits::load(&config.data_dir)?;

    println!();
    println!("{}", "Starting Training...".green().bold());
    println!();

    let mut trainer = Trainer::new(model, &config, device.clone());
    let outcome = trainer.fit(&splits)?;
    info!("Training terminated: {}", outcome.reason);

    println!();
    println!("{}", "Evaluating on test split...".cyan());
    let _report = evaluate(trainer.model(), &splits, &device, config.batch_size)?;

    std::fs::create_dir_all(&config.output_dir)?;
    let checkpoint_path = config.output_dir.join("vgg16_finetuned");
    let recorder = CompactRecorder::new();
    trainer
        .model()
        .clone()
        .save_file(&checkpoint_path, &recorder)
        .map_err(|e| anyhow::anyhow!("Failed to save model: {:?}", e))?;
    config.save(&config.output_dir.join("config.json"))?;
    println!("Saved best model to {:?}", checkpoint_path);

    println!(
        "Total time is: {:.2} minutes",
        started.elapsed().as_secs_f64() / 60.0
    );

    Ok(())
}

fn cmd_evaluate(
    model_path: &str,
    data_dir: &Path,
    hardware: Hardware,
    batch_size: usize,
) -> Result<()> {
    let device = select_device(hardware);

    println!("{}", "Loading model...".cyan());
    let model_config = Vgg16Config::new();
    let model = Vgg16::<TrainingBackend>::new(&model_config, &device);
    let recorder = CompactRecorder::new();
    let model = model
        .load_file(model_path, &recorder, &device)
        .map_err(|e| anyhow::anyhow!("Failed to load model: {:?}", e))?;

    let splits = DataSplits::load(data_dir)?;
    let _report = evaluate(&model, &splits, &device, batch_size)?;

    Ok(())
}

fn cmd_stats(data_dir: &Path) -> Result<()> {
    info!("Computing dataset statistics for: {:?}", data_dir);

    let splits = DataSplits::load(data_dir)?;
    splits.stats().print();

    Ok(())
}
