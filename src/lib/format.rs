//! Detection of the record format of a file from its name.
//!
//! Each [`Format`] owns a group of recognized file suffixes, optionally followed by `.gz`.  The
//! format is decided once per file and never re-checked while records are being processed.

use std::path::Path;

use clap::{ArgEnum, PossibleValue};
use thiserror::Error;

/// The suffix that marks a gzip compressed file.
pub const GZIP_SUFFIX: &str = ".gz";

/// Suffixes recognized for FASTQ files, without the optional [`GZIP_SUFFIX`].
const FASTQ_SUFFIXES: &[&str] = &[".fastq", ".fq"];
/// Suffixes recognized for FASTA files, without the optional [`GZIP_SUFFIX`].
const FASTA_SUFFIXES: &[&str] = &[".fasta", ".fa"];
/// Suffixes recognized for raw (one sequence per line) files, without the optional [`GZIP_SUFFIX`].
const RAW_SUFFIXES: &[&str] = &[".txt"];

/// The error returned when a file name does not match any known suffix group.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error(
        "Unsupported file format for `{name}`, expected one of .fastq, .fq, .fasta, .fa or .txt (optionally followed by .gz)"
    )]
    Unsupported { name: String },

    #[error("Cannot infer the record format of `-`, please specify it explicitly")]
    StandardStream,
}

/// The record framing conventions understood by the reader and writer.
#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Four lines per record: `@header`, sequence, separator, quality.
    Fastq,
    /// Two lines per record: `>header`, sequence.
    Fasta,
    /// One sequence per line.
    Raw,
}

impl Format {
    pub fn possible_values<'a>() -> impl Iterator<Item = PossibleValue<'a>> {
        Format::value_variants().iter().filter_map(ArgEnum::to_possible_value)
    }

    /// The file name suffixes that identify this format.
    fn suffixes(self) -> &'static [&'static str] {
        match self {
            Format::Fastq => FASTQ_SUFFIXES,
            Format::Fasta => FASTA_SUFFIXES,
            Format::Raw => RAW_SUFFIXES,
        }
    }

    /// Determine the [`Format`] of a file from its name.
    ///
    /// Only the final component of the path is examined and the comparison ignores case.  A
    /// trailing `.gz` is accepted after any of the suffixes.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Self, FormatError> {
        let name = path
            .as_ref()
            .file_name()
            .map_or_else(|| path.as_ref().to_string_lossy(), |n| n.to_string_lossy())
            .to_ascii_lowercase();
        if name == "-" {
            return Err(FormatError::StandardStream);
        }
        let stem = name.strip_suffix(GZIP_SUFFIX).unwrap_or(&name);

        [Format::Fastq, Format::Fasta, Format::Raw]
            .into_iter()
            .find(|format| format.suffixes().iter().any(|suffix| stem.ends_with(suffix)))
            .ok_or_else(|| FormatError::Unsupported {
                name: path.as_ref().to_string_lossy().to_string(),
            })
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Format::Fastq => "FASTQ",
            Format::Fasta => "FASTA",
            Format::Raw => "raw",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for variant in Self::value_variants() {
            if variant.to_possible_value().unwrap().matches(s, true) {
                return Ok(*variant);
            }
        }
        Err(anyhow::anyhow!("Invalid record format: {}", s))
    }
}

/// True if the path names a gzip compressed file.
pub fn is_gzipped<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().to_string_lossy().to_ascii_lowercase().ends_with(GZIP_SUFFIX)
}
