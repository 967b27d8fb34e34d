//! Gradecast - Main Entry Point
//!
//! Student outcome prediction: generate data, train, and serve predictions.

use clap::Parser;
use gradecast::cli::{cmd_feature_info, cmd_generate, cmd_predict, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gradecast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { count, seed, output } => {
            cmd_generate(count, seed, &output)?;
        }
        Commands::Train {
            count,
            seed,
            test_fraction,
            n_estimators,
            cv_folds,
            model,
            encoders,
        } => {
            cmd_train(count, seed, test_fraction, n_estimators, cv_folds, &model, &encoders)?;
        }
        Commands::Predict { model, encoders, input } => {
            cmd_predict(&model, &encoders, &input)?;
        }
        Commands::FeatureInfo => {
            cmd_feature_info()?;
        }
    }

    Ok(())
}
