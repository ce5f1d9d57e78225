//! Removal of bases from the 3' end of reads.
//!
//! Two modes are supported and a run uses at most one of them:
//!
//! - [`TrimMode::Iterative`] repeatedly removes the last base while it matches the target base and
//!   the read is longer than a minimum retained length.
//! - [`TrimMode::SingleShot`] removes exactly one trailing base when it matches, and rejects the
//!   read otherwise.
//!
//! Base comparisons ignore case.  Qualities are cut at the same position as the sequence.

use log::debug;
use thiserror::Error;

use crate::record::Record;

/// The errors that can occur when building a [`TrimMode`] from options.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TrimConfigError {
    #[error("Iterative trimming and single base trimming cannot be combined")]
    Conflicting,

    #[error("Invalid trim base `{0}`, expected a single ASCII letter")]
    InvalidBase(char),
}

/// How reads are trimmed during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimMode {
    /// Reads are left untouched.
    #[default]
    Off,
    /// Remove trailing `base`s while the read is longer than `min_retained_length`.
    Iterative { base: u8, min_retained_length: usize },
    /// Remove a single trailing `base`, rejecting reads that do not end in it.
    SingleShot { base: u8 },
}

/// The result of trimming one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimOutcome {
    /// The read continues to the filter, `removed` bases were taken off its 3' end.
    Kept { record: Record, removed: usize },
    /// The read must not be written.
    Rejected,
}

fn validate_base(base: char) -> Result<u8, TrimConfigError> {
    if base.is_ascii_alphabetic() {
        Ok(base as u8)
    } else {
        Err(TrimConfigError::InvalidBase(base))
    }
}

impl TrimMode {
    /// Build the trim mode from the individual options.
    ///
    /// `trim` selects iterative trimming with `min_retained_length`, `trim_single` selects single
    /// base trimming.  Giving both is an error.
    pub fn from_options(
        trim: Option<char>,
        min_retained_length: usize,
        trim_single: Option<char>,
    ) -> Result<Self, TrimConfigError> {
        let mode = match (trim, trim_single) {
            (Some(_), Some(_)) => return Err(TrimConfigError::Conflicting),
            (Some(base), None) => {
                TrimMode::Iterative { base: validate_base(base)?, min_retained_length }
            }
            (None, Some(base)) => TrimMode::SingleShot { base: validate_base(base)? },
            (None, None) => TrimMode::Off,
        };
        debug!("Using trim mode {:?}", mode);
        Ok(mode)
    }

    /// True if removed bases are counted for this mode.
    pub fn is_iterative(&self) -> bool {
        matches!(self, TrimMode::Iterative { .. })
    }

    /// Trim a single read.
    pub fn apply(&self, record: Record) -> TrimOutcome {
        match *self {
            TrimMode::Off => TrimOutcome::Kept { record, removed: 0 },
            TrimMode::Iterative { base, min_retained_length } => {
                let (trimmed, removed) = trim_3p(&record.seq, base, min_retained_length);
                let len = trimmed.len();
                TrimOutcome::Kept { record: record.truncated(len), removed }
            }
            TrimMode::SingleShot { base } => match record.last_base() {
                Some(last) if last.eq_ignore_ascii_case(&base) => {
                    let len = record.len() - 1;
                    TrimOutcome::Kept { record: record.truncated(len), removed: 1 }
                }
                _ => TrimOutcome::Rejected,
            },
        }
    }
}

/// Remove trailing `base`s from `seq` while it is longer than `min_retained_length`.
///
/// Returns the trimmed sequence and the number of bases removed.
pub fn trim_3p(seq: &[u8], base: u8, min_retained_length: usize) -> (&[u8], usize) {
    let mut len = seq.len();
    while len > min_retained_length && seq[len - 1].eq_ignore_ascii_case(&base) {
        len -= 1;
    }
    (&seq[..len], seq.len() - len)
}
