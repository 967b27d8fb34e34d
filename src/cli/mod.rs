//! Command-line interface for dataset generation, training, and serving
//! single predictions from persisted artifacts.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::inference::InferenceEngine;
use crate::schema::{feature_info, StudentRecord};
use crate::synthetic::{write_snapshot, StudentGenerator};
use crate::training::{TrainConfig, Trainer};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<18} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "gradecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Student outcome prediction: synthetic data, training, inference")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a synthetic labeled student dataset
    Generate {
        /// Number of records to generate
        #[arg(short, long, default_value = "1000")]
        count: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output CSV file
        #[arg(short, long, default_value = "students.csv")]
        output: PathBuf,
    },

    /// Train a model on a generated dataset and persist the artifacts
    Train {
        /// Number of synthetic records to train on
        #[arg(short, long, default_value = "1000")]
        count: usize,

        /// Random seed for generation, splitting, and tree fitting
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Fraction of records held out for testing
        #[arg(long, default_value = "0.2")]
        test_fraction: f64,

        /// Number of trees in the forest
        #[arg(long, default_value = "100")]
        n_estimators: usize,

        /// Number of cross-validation folds
        #[arg(long, default_value = "5")]
        cv_folds: usize,

        /// Output model file
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Output encoders file
        #[arg(short, long, default_value = "encoders.json")]
        encoders: PathBuf,
    },

    /// Predict the outcome for one student record
    Predict {
        /// Trained model file
        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,

        /// Fitted encoders file
        #[arg(short, long, default_value = "encoders.json")]
        encoders: PathBuf,

        /// JSON file with the student record ("-" reads stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the feature schema as JSON
    FeatureInfo,
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_generate(count: usize, seed: u64, output: &PathBuf) -> anyhow::Result<()> {
    section("Generate");

    step_run(&format!("Sampling {count} records"));
    let start = Instant::now();
    let mut df = StudentGenerator::new(seed).generate(count)?;
    step_done(&format!("{:?}", start.elapsed()));

    write_snapshot(&mut df, output)?;
    kv("Output", &output.display().to_string());
    kv("Seed", &seed.to_string());
    println!();
    Ok(())
}

pub fn cmd_train(
    count: usize,
    seed: u64,
    test_fraction: f64,
    n_estimators: usize,
    cv_folds: usize,
    model_path: &PathBuf,
    encoders_path: &PathBuf,
) -> anyhow::Result<()> {
    section("Train");

    step_run(&format!("Generating {count} records"));
    let df = StudentGenerator::new(seed).generate(count)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    let config = TrainConfig {
        test_fraction,
        seed,
        n_estimators,
        cv_folds,
        ..TrainConfig::default()
    };

    step_run(&format!("Training {} trees", n_estimators.to_string().cyan()));
    let start = Instant::now();
    let output = Trainer::new(config).train(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    let report = &output.report;
    println!();
    kv("Accuracy", &format!("{:.4}", report.accuracy));
    kv(
        "CV accuracy",
        &format!("{:.4} (+/- {:.4})", report.cv.mean, 2.0 * report.cv.std),
    );
    for class in &report.classes {
        kv(
            &class.label,
            &format!(
                "precision {:.3}  recall {:.3}  f1 {:.3}  n={}",
                class.precision, class.recall, class.f1, class.support
            ),
        );
    }

    section("Top features");
    for factor in report.ranked_importances.iter().take(10) {
        kv(&factor.feature, &format!("{:.4}", factor.importance));
    }

    output.artifact.save(model_path)?;
    output.encoders.save(encoders_path)?;
    println!();
    kv("Model", &model_path.display().to_string());
    kv("Encoders", &encoders_path.display().to_string());
    println!();
    Ok(())
}

pub fn cmd_predict(
    model_path: &PathBuf,
    encoders_path: &PathBuf,
    input: &PathBuf,
) -> anyhow::Result<()> {
    let engine = InferenceEngine::from_files(model_path, encoders_path)?;

    let payload = if input.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(input)?
    };
    let value: serde_json::Value = serde_json::from_str(&payload)
        .map_err(|e| anyhow::anyhow!("invalid JSON record: {e}"))?;
    let record = StudentRecord::from_json(value)?;

    let result = engine.predict(&record)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn cmd_feature_info() -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&feature_info())?);
    Ok(())
}
