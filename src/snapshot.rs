use std::{
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use burn::record::RecorderError;
use chrono::Utc;
use thiserror::Error;

use crate::{algo::tabular::QTable, stats::Aggregate};

/// Checkpoints are the only durable artifact of a training run, so every
/// failure here is surfaced instead of being logged and swallowed.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("table encoding failed: {0}")]
    Encode(#[from] bincode::Error),
    #[error("model serialization failed: {0}")]
    Model(#[from] RecorderError),
}

/// Write a Q-table as a flat binary snapshot named by episode number
///
/// **Returns** the path of the written file
pub fn save_q_table(
    dir: impl AsRef<Path>,
    episode: u32,
    table: &QTable,
) -> Result<PathBuf, SnapshotError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{episode:05}-qtable.bin"));
    let file = BufWriter::new(File::create(&path)?);
    bincode::serialize_into(file, table)?;
    Ok(path)
}

/// Read back a Q-table snapshot written by [`save_q_table`]
pub fn load_q_table(path: impl AsRef<Path>) -> Result<QTable, SnapshotError> {
    let file = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(file)?)
}

/// File stem for a model checkpoint, embedding trailing reward statistics and a
/// timestamp so good checkpoints can be picked out by hand later
pub fn model_file_stem(name: &str, agg: &Aggregate) -> String {
    format!(
        "{name}__{max:.2}max_{avg:.2}avg_{min:.2}min__{ts}",
        max = agg.max,
        avg = agg.avg,
        min = agg.min,
        ts = Utc::now().format("%Y%m%d-%H%M%S"),
    )
}
