//! Drives reads from a [`RecordReader`] through trimming and filtering into a [`RecordWriter`].
//!
//! A [`Pipeline`] moves through the states `Idle -> Running -> Completed`, or `Failed` when an
//! error stops it.  Exactly one record is held at a time: it is pulled from the reader, trimmed,
//! counted, tested against the filter and then either written or dropped before the next record
//! is pulled.  Any read or write error is fatal and is returned together with the counters
//! collected up to that point.

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::{
    filter::FilterParams,
    metrics::RunCounters,
    reader::{ReadError, RecordReader},
    trim::{TrimMode, TrimOutcome},
    writer::RecordWriter,
};

/// The lifecycle of a [`Pipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Completed,
    Failed,
}

/// The fatal errors that stop a [`Pipeline`].
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("Failed to write output record {index}")]
    Write {
        index: usize,
        #[source]
        source: io::Error,
    },

    #[error("Failed to flush the output")]
    Flush(#[source] io::Error),

    #[error("A pipeline can only be run once, it is currently {0:?}")]
    AlreadyRun(PipelineState),
}

/// A [`PipelineError`] together with the counters collected before it occurred.
#[derive(Error, Debug)]
#[error("Processing stopped after {counters}")]
pub struct PipelineFailure {
    pub counters: RunCounters,
    #[source]
    pub source: PipelineError,
}

/// Reads, trims, filters and writes records one at a time.
pub struct Pipeline<R, W> {
    reader: RecordReader<R>,
    writer: RecordWriter<W>,
    trim_mode: TrimMode,
    filter: FilterParams,
    counters: RunCounters,
    state: PipelineState,
}

impl<R: BufRead, W: Write> Pipeline<R, W> {
    /// Create a new idle [`Pipeline`].
    pub fn new(
        reader: RecordReader<R>,
        writer: RecordWriter<W>,
        trim_mode: TrimMode,
        filter: FilterParams,
    ) -> Self {
        Self {
            reader,
            writer,
            trim_mode,
            filter,
            counters: RunCounters::default(),
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The counters collected so far.
    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    /// Process every record of the input.
    ///
    /// On success the final counters are returned and the output has been flushed.
    pub fn run(&mut self) -> Result<RunCounters, PipelineFailure> {
        if self.state != PipelineState::Idle {
            return Err(PipelineFailure {
                counters: self.counters,
                source: PipelineError::AlreadyRun(self.state),
            });
        }
        self.state = PipelineState::Running;
        match self.process() {
            Ok(()) => {
                self.state = PipelineState::Completed;
                Ok(self.counters)
            }
            Err(source) => {
                self.state = PipelineState::Failed;
                Err(PipelineFailure { counters: self.counters, source })
            }
        }
    }

    fn process(&mut self) -> Result<(), PipelineError> {
        let count_removed = self.trim_mode.is_iterative();
        while let Some(record) = self.reader.next().transpose()? {
            let record = match self.trim_mode.apply(record) {
                TrimOutcome::Kept { record, removed } => {
                    self.counters.record_input(if count_removed { removed } else { 0 });
                    record
                }
                TrimOutcome::Rejected => {
                    self.counters.record_input(0);
                    continue;
                }
            };

            if self.filter.keep(&record.seq) {
                let index = self.counters.next_output_index();
                self.writer
                    .write(record, index)
                    .map_err(|source| PipelineError::Write { index, source })?;
                self.counters.record_output();
            }
        }
        self.writer.flush().map_err(PipelineError::Flush)
    }

    /// Consume the pipeline, returning the output stream.
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}
