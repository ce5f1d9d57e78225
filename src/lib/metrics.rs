//! Counters collected while filtering reads.
//!
//! A single [`RunCounters`] is owned by the [`crate::pipeline::Pipeline`] and only ever grows
//! during a run.  Once the run has finished the counters can be written to a metrics file.

use std::path::Path;

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};

/// The counters for one run over an input file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// The number of complete records read from the input.
    pub input_count: usize,
    /// The number of records written to the output.
    pub output_count: usize,
    /// The number of bases removed by iterative 3' trimming.
    pub trimmed_nucleotide_count: usize,
}

impl RunCounters {
    /// Count one record read from the input, `removed` bases of which were trimmed.
    pub fn record_input(&mut self, removed: usize) {
        self.input_count += 1;
        self.trimmed_nucleotide_count += removed;
    }

    /// The 1-based output index the next written record will have.
    pub fn next_output_index(&self) -> usize {
        self.output_count + 1
    }

    /// Count one record written to the output.
    pub fn record_output(&mut self) {
        self.output_count += 1;
    }

    /// The number of records that were read but not written.
    pub fn discarded_count(&self) -> usize {
        self.input_count - self.output_count
    }

    /// Write the counters as a single row TSV with a header line.
    pub fn write_metrics_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let delim = DelimFile::default();
        delim.write_tsv(&path.as_ref(), std::iter::once(*self)).with_context(|| {
            format!("Failed to write metrics to {}", path.as_ref().to_string_lossy())
        })?;
        Ok(())
    }
}

impl std::fmt::Display for RunCounters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} input records, {} output records and {} trimmed bases",
            self.input_count, self.output_count, self.trimmed_nucleotide_count
        )
    }
}
