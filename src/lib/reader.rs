//! Lazy, format specific readers that turn a decoded text stream into [`Record`]s.
//!
//! Every format frames a record as a fixed number of lines: four for FASTQ, two for FASTA and one
//! for raw input.  Lines are pulled one record at a time from the underlying [`BufRead`], so memory
//! use does not depend on the size of the input.
//!
//! When the stream ends part way through a record the partial group of lines is dropped: the
//! reader logs a warning and reports the end of the stream.  It is never counted as a record.

use std::io::BufRead;

use bstr::io::{BufReadExt, ByteLines};
use bstr::ByteSlice;
use log::warn;
use thiserror::Error;

use crate::{format::Format, record::Record};

/// The errors that can occur while pulling records from a stream.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Failed to read line {line} of the input")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Record {record} starting on line {line}: expected the header to start with `{expected}`, found `{found}`"
    )]
    MissingHeaderPrefix { record: usize, line: usize, expected: char, found: String },

    #[error(
        "Record {record} starting on line {line}: sequence has {seq_len} bases but quality has {qual_len} values"
    )]
    UnequalLengths { record: usize, line: usize, seq_len: usize, qual_len: usize },
}

/// Pulls fixed size groups of lines from a stream, keeping track of line and record numbers.
struct LineFramer<R> {
    lines: ByteLines<R>,
    /// Number of lines consumed so far.
    lines_read: usize,
    /// Number of complete groups returned so far.
    groups_read: usize,
    /// Number of lines in a trailing partial group that was dropped.
    dropped_lines: usize,
    done: bool,
}

impl<R: BufRead> LineFramer<R> {
    fn new(reader: R) -> Self {
        Self { lines: reader.byte_lines(), lines_read: 0, groups_read: 0, dropped_lines: 0, done: false }
    }

    /// The 1-based line number on which the next group starts.
    fn next_line_number(&self) -> usize {
        self.lines_read + 1
    }

    /// Read the next `N` lines, returning `None` once the stream is exhausted.
    ///
    /// A group that is cut short by the end of the stream is discarded.
    fn next_group<const N: usize>(&mut self) -> Result<Option<[Vec<u8>; N]>, ReadError> {
        if self.done {
            return Ok(None);
        }
        let mut group: [Vec<u8>; N] = std::array::from_fn(|_| Vec::new());
        for (i, slot) in group.iter_mut().enumerate() {
            match self.lines.next() {
                Some(Ok(line)) => {
                    self.lines_read += 1;
                    *slot = line;
                }
                Some(Err(source)) => {
                    self.done = true;
                    return Err(ReadError::Io { line: self.lines_read + 1, source });
                }
                None => {
                    self.done = true;
                    if i > 0 {
                        self.dropped_lines = i;
                        warn!(
                            "Input ended part way through record {} ({} of {} lines present), dropping it",
                            self.groups_read + 1,
                            i,
                            N
                        );
                    }
                    return Ok(None);
                }
            }
        }
        self.groups_read += 1;
        Ok(Some(group))
    }
}

/// Strip the expected header prefix from a header line.
fn strip_header(
    mut line: Vec<u8>,
    prefix: u8,
    record: usize,
    line_number: usize,
) -> Result<Vec<u8>, ReadError> {
    if line.first() == Some(&prefix) {
        line.remove(0);
        Ok(line)
    } else {
        Err(ReadError::MissingHeaderPrefix {
            record,
            line: line_number,
            expected: prefix as char,
            found: line.to_str_lossy().into_owned(),
        })
    }
}

/// Reads FASTQ records: header, sequence, separator and quality lines.
///
/// The separator line is kept as read, without inspection.
pub struct FastqReader<R> {
    framer: LineFramer<R>,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self { framer: LineFramer::new(reader) }
    }

    fn read_next(&mut self) -> Result<Option<Record>, ReadError> {
        let line = self.framer.next_line_number();
        let Some([head, seq, sep, qual]) = self.framer.next_group::<4>()? else {
            return Ok(None);
        };
        let record = self.framer.groups_read;
        let head = strip_header(head, b'@', record, line)?;
        if seq.len() != qual.len() {
            return Err(ReadError::UnequalLengths {
                record,
                line,
                seq_len: seq.len(),
                qual_len: qual.len(),
            });
        }
        Ok(Some(Record { head: Some(head), seq, sep: Some(sep), qual: Some(qual) }))
    }
}

/// Reads two line FASTA records: header and sequence.
pub struct FastaReader<R> {
    framer: LineFramer<R>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self { framer: LineFramer::new(reader) }
    }

    fn read_next(&mut self) -> Result<Option<Record>, ReadError> {
        let line = self.framer.next_line_number();
        let Some([head, seq]) = self.framer.next_group::<2>()? else {
            return Ok(None);
        };
        let head = strip_header(head, b'>', self.framer.groups_read, line)?;
        Ok(Some(Record { head: Some(head), seq, sep: None, qual: None }))
    }
}

/// Reads one sequence per line.
pub struct RawReader<R> {
    framer: LineFramer<R>,
}

impl<R: BufRead> RawReader<R> {
    pub fn new(reader: R) -> Self {
        Self { framer: LineFramer::new(reader) }
    }

    fn read_next(&mut self) -> Result<Option<Record>, ReadError> {
        Ok(self.framer.next_group::<1>()?.map(|[seq]| Record::from_seq(seq)))
    }
}

/// A reader for one of the supported [`Format`]s, chosen once when the stream is opened.
///
/// Iterating yields `Result<Record, ReadError>`.  The iterator is finite and cannot be restarted;
/// after the end of the stream or an error it keeps returning `None`.
pub enum RecordReader<R> {
    Fastq(FastqReader<R>),
    Fasta(FastaReader<R>),
    Raw(RawReader<R>),
}

impl<R: BufRead> RecordReader<R> {
    /// Create the reader for `format` over `reader`.
    pub fn new(format: Format, reader: R) -> Self {
        match format {
            Format::Fastq => RecordReader::Fastq(FastqReader::new(reader)),
            Format::Fasta => RecordReader::Fasta(FastaReader::new(reader)),
            Format::Raw => RecordReader::Raw(RawReader::new(reader)),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            RecordReader::Fastq(_) => Format::Fastq,
            RecordReader::Fasta(_) => Format::Fasta,
            RecordReader::Raw(_) => Format::Raw,
        }
    }

    /// The number of lines in a trailing partial record that was dropped, zero if none.
    pub fn dropped_trailing_lines(&self) -> usize {
        self.framer().dropped_lines
    }

    fn framer(&self) -> &LineFramer<R> {
        match self {
            RecordReader::Fastq(r) => &r.framer,
            RecordReader::Fasta(r) => &r.framer,
            RecordReader::Raw(r) => &r.framer,
        }
    }

    fn framer_mut(&mut self) -> &mut LineFramer<R> {
        match self {
            RecordReader::Fastq(r) => &mut r.framer,
            RecordReader::Fasta(r) => &mut r.framer,
            RecordReader::Raw(r) => &mut r.framer,
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self {
            RecordReader::Fastq(r) => r.read_next(),
            RecordReader::Fasta(r) => r.read_next(),
            RecordReader::Raw(r) => r.read_next(),
        };
        if result.is_err() {
            self.framer_mut().done = true;
        }
        result.transpose()
    }
}
