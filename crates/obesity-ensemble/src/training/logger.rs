//! Training progress logging.
//!
//! [`TrainingLogger`] gates per-round output by [`Verbosity`] and emits it as
//! `tracing` events, so the subscriber installed by the caller decides where
//! it goes.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// How much the trainers report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Verbosity {
    /// Nothing.
    Silent,
    /// Only problems.
    Warning,
    /// Start and end of every training run.
    #[default]
    Info,
    /// Per-round metrics.
    Debug,
}

/// Logs the progress of one training run.
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    model: &'static str,
    n_rounds: usize,
    started: Option<Instant>,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity, model: &'static str) -> Self {
        Self { verbosity, model, n_rounds: 0, started: None }
    }

    #[inline]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn start_training(&mut self, n_rounds: usize) {
        self.n_rounds = n_rounds;
        self.started = Some(Instant::now());
        if self.verbosity >= Verbosity::Info {
            tracing::info!(model = self.model, rounds = n_rounds, "training started");
        }
    }

    /// Log one round's metric. Only emitted at [`Verbosity::Debug`].
    pub fn log_round(&self, round: usize, metric: &'static str, value: f64) {
        if self.verbosity >= Verbosity::Debug {
            tracing::debug!(
                model = self.model,
                round = round + 1,
                of = self.n_rounds,
                metric,
                value,
                "round finished"
            );
        }
    }

    pub fn warn(&self, message: &str) {
        if self.verbosity >= Verbosity::Warning {
            tracing::warn!(model = self.model, "{message}");
        }
    }

    pub fn finish_training(&self) {
        if self.verbosity >= Verbosity::Info {
            let elapsed = self.started.map(|t| t.elapsed().as_secs_f64()).unwrap_or_default();
            tracing::info!(model = self.model, elapsed_secs = elapsed, "training finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_is_ordered() {
        assert!(Verbosity::Silent < Verbosity::Warning);
        assert!(Verbosity::Info < Verbosity::Debug);
        assert_eq!(Verbosity::default(), Verbosity::Info);
    }

    #[test]
    fn silent_logger_runs_without_subscriber() {
        let mut logger = TrainingLogger::new(Verbosity::Silent, "test");
        logger.start_training(3);
        logger.log_round(0, "logloss", 0.5);
        logger.warn("nothing");
        logger.finish_training();
        assert_eq!(logger.verbosity(), Verbosity::Silent);
    }
}
