use std::{fs::File, path::Path};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("failed to write metrics: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush metrics: {0}")]
    Io(#[from] std::io::Error),
}

/// Aggregate reward statistics over a trailing window of episodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-episode cumulative rewards, aggregated over a trailing window
#[derive(Debug, Clone, Default)]
pub struct RewardHistory {
    rewards: Vec<f64>,
}

impl RewardHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reward: f64) {
        self.rewards.push(reward);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Mean, min, and max over the trailing `window` episodes, or fewer if the
    /// history is still short
    ///
    /// **Returns** `None` when no episodes have been recorded
    pub fn aggregate(&self, window: usize) -> Option<Aggregate> {
        if self.rewards.is_empty() || window == 0 {
            return None;
        }
        let tail = &self.rewards[self.rewards.len().saturating_sub(window)..];
        let avg = tail.iter().sum::<f64>() / tail.len() as f64;
        let min = tail.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = tail.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some(Aggregate { avg, min, max })
    }
}

/// A sink for named scalar metrics tagged with a step index
///
/// This replaces callback-style logging hooks: the training loop calls
/// [`record`](Recorder::record) directly after each aggregation interval.
pub trait Recorder {
    fn record(&mut self, step: u32, metrics: &[(&str, f64)]) -> Result<(), RecordError>;
}

/// A [`Recorder`] appending a CSV time series, one row per record call
///
/// The header is derived from the metric names of the first record.
pub struct CsvRecorder {
    writer: csv::Writer<File>,
    wrote_header: bool,
}

impl CsvRecorder {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
            wrote_header: false,
        })
    }
}

impl Recorder for CsvRecorder {
    fn record(&mut self, step: u32, metrics: &[(&str, f64)]) -> Result<(), RecordError> {
        if !self.wrote_header {
            let header = std::iter::once("episode").chain(metrics.iter().map(|(name, _)| *name));
            self.writer.write_record(header)?;
            self.wrote_header = true;
        }

        let row = std::iter::once(step.to_string())
            .chain(metrics.iter().map(|(_, value)| value.to_string()));
        self.writer.write_record(row)?;
        self.writer.flush()?;
        Ok(())
    }
}
