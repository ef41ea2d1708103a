// ============================================================
// Layer 6 — Progress Output
// ============================================================
// Two places a progress record can go:
//
//   ConsoleSink   — prints the human-readable line to stdout and,
//                   if configured, forwards to a MetricsLogger
//   MetricsLogger — appends the record as a CSV row
//
// CSV columns:
//   phase,epoch,iteration,examples,loss,accuracy
//   train,1,1,64,0.693147,0.500000
//   test,0,1,64,0.512004,0.750000
//
// The file is appended to across runs; the header is written
// only when the file is created.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use crate::domain::progress::ProgressRecord;
use crate::domain::traits::ProgressSink;

const CSV_HEADER: &str = "phase,epoch,iteration,examples,loss,accuracy";

/// Appends progress records to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the parent directory and the header row if needed.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, r: &ProgressRecord) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{},{},{:.6},{:.6}",
            r.phase.as_str(),
            r.epoch,
            r.iteration,
            r.examples,
            r.loss,
            r.accuracy,
        )?;
        Ok(())
    }
}

impl ProgressSink for MetricsLogger {
    fn record(&mut self, record: &ProgressRecord) -> Result<()> {
        self.log(record)
    }
}

/// Prints one line per record; optionally mirrors records to CSV.
#[derive(Default)]
pub struct ConsoleSink {
    csv: Option<MetricsLogger>,
}

impl ConsoleSink {
    pub fn new(csv: Option<MetricsLogger>) -> Self {
        Self { csv }
    }
}

impl ProgressSink for ConsoleSink {
    fn record(&mut self, record: &ProgressRecord) -> Result<()> {
        println!("{record}");
        if let Some(csv) = self.csv.as_mut() {
            csv.record(record)?;
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::progress::Phase;

    fn record(phase: Phase, iteration: usize) -> ProgressRecord {
        ProgressRecord {
            phase, epoch: 1, iteration, examples: iteration * 2,
            loss: 0.5, accuracy: 0.25,
        }
    }

    #[test]
    fn test_header_written_once_and_rows_appended() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs").join("metrics.csv");

        let mut logger = MetricsLogger::new(&path).unwrap();
        logger.record(&record(Phase::Train, 1)).unwrap();

        // Reopening must not write a second header
        let mut logger = MetricsLogger::new(&path).unwrap();
        logger.record(&record(Phase::Test, 2)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            CSV_HEADER,
            "train,1,1,2,0.500000,0.250000",
            "test,1,2,4,0.500000,0.250000",
        ]);
    }

    #[test]
    fn test_console_sink_forwards_to_csv() {
        let tmp  = tempfile::tempdir().unwrap();
        let path = tmp.path().join("m.csv");
        let mut sink = ConsoleSink::new(Some(MetricsLogger::new(&path).unwrap()));

        sink.record(&record(Phase::Train, 1)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
