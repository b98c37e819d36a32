//! Traffic sign classifier CLI
//!
//! `traffic data_directory [model_output_path]`
//!
//! Loads the images under `data_directory`, trains the CNN, reports test-set
//! loss and accuracy and optionally saves the trained model.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;

use traffic_signs::backend::{backend_name, TrainingBackend};
use traffic_signs::training::run_training;
use traffic_signs::utils::logging::{init_logging, LogConfig};
use traffic_signs::{RunConfig, VERSION};

/// Train a convolutional network to classify traffic signs
#[derive(Parser, Debug)]
#[command(name = "traffic")]
#[command(version)]
#[command(about = "Train a traffic sign classifier with Burn", long_about = None)]
struct Cli {
    /// Directory holding one numbered subdirectory of images per category
    data_directory: PathBuf,

    /// File to save the trained model to
    model_output_path: Option<PathBuf>,

    /// Seed for a reproducible train/test split and shuffle
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config).map_err(|e| anyhow!(e))?;

    info!("traffic_signs v{} on {}", VERSION, backend_name());

    let mut config = RunConfig::default();
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    println!("{}", "Training traffic sign classifier...".green().bold());

    let outcome = run_training::<TrainingBackend>(
        &cli.data_directory,
        cli.model_output_path.as_deref(),
        &config,
    )
    .with_context(|| format!("Training on {} failed", cli.data_directory.display()))?;

    println!();
    println!(
        "  {} {} samples ({} train / {} test, {} unreadable files skipped)",
        "Data:".cyan().bold(),
        outcome.dataset_stats.total_samples,
        outcome.train_size,
        outcome.test_size,
        outcome.dataset_stats.skipped_files
    );
    if let Some(last) = outcome.history.last() {
        println!(
            "  {} loss: {:.4} - accuracy: {:.4}",
            "Train:".cyan().bold(),
            last.loss,
            last.accuracy
        );
    }
    println!("  {} {}", "Test:".cyan().bold(), outcome.report);

    if let Some(path) = outcome.model_path {
        println!("Model saved to {}.", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_one_positional() {
        let cli = Cli::try_parse_from(["traffic", "gtsrb"]).unwrap();
        assert_eq!(cli.data_directory, PathBuf::from("gtsrb"));
        assert!(cli.model_output_path.is_none());
        assert!(cli.seed.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_two_positionals() {
        let cli = Cli::try_parse_from(["traffic", "gtsrb", "model.h5"]).unwrap();
        assert_eq!(cli.model_output_path, Some(PathBuf::from("model.h5")));
    }

    #[test]
    fn test_no_positionals_is_usage_error() {
        let err = Cli::try_parse_from(["traffic"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_three_positionals_is_usage_error() {
        let err = Cli::try_parse_from(["traffic", "gtsrb", "model.h5", "extra"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from(["traffic", "--seed", "7", "-v", "gtsrb"]).unwrap();
        assert_eq!(cli.seed, Some(7));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
