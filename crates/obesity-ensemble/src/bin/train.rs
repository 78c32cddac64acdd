//! Train the obesity-level ensemble with the default configuration.
//!
//! Reads `data/raw/train.csv`, fits the feature transform and the three
//! ensemble members, prints the holdout accuracy and writes the artifact to
//! `models/new_model.sav`.
//!
//! Usage:
//!   cargo run --release --bin train
//!
//! Log output goes to stderr at `info` level; set `RUST_LOG` to change it.

use std::process::ExitCode;

use obesity_ensemble::{PipelineConfig, pipeline};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = PipelineConfig::default();
    match pipeline::run(&config) {
        Ok(report) => {
            println!("trained model accuracy on test set: {}", report.accuracy);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "training failed");
            ExitCode::FAILURE
        }
    }
}
