//! Format specific writers that serialize kept [`Record`]s.
//!
//! Fields the output format needs but the record lacks are synthesized:
//!
//! - a missing header becomes `<name prefix>_<n>`, `n` being the 1-based index of the read among
//!   the written reads;
//! - a missing quality string becomes [`PLACEHOLDER_QUALITY`] repeated for every base;
//! - a missing FASTQ separator line becomes `+`.

use std::io::{self, Write};

use crate::{format::Format, record::Record};

/// The quality character written for reads that have no qualities.
pub const PLACEHOLDER_QUALITY: u8 = b'I';

/// The default prefix for synthesized read names.
pub const DEFAULT_NAME_PREFIX: &str = "Seq";

/// Return the header to write, without the format's header prefix.
///
/// An existing header that already starts with `prefix` has it removed so that it is not doubled
/// when written.
fn header_or_default(head: Option<Vec<u8>>, prefix: u8, name_prefix: &str, index: usize) -> Vec<u8> {
    match head {
        Some(mut head) => {
            if head.first() == Some(&prefix) {
                head.remove(0);
            }
            head
        }
        None => format!("{}_{}", name_prefix, index).into_bytes(),
    }
}

/// Writes four line FASTQ records.
pub struct FastqWriter<W> {
    inner: W,
    name_prefix: String,
}

impl<W: Write> FastqWriter<W> {
    pub fn new(inner: W, name_prefix: &str) -> Self {
        Self { inner, name_prefix: name_prefix.to_string() }
    }

    fn write(&mut self, record: Record, index: usize) -> io::Result<()> {
        let Record { head, seq, sep, qual } = record;
        let head = header_or_default(head, b'@', &self.name_prefix, index);
        let qual = qual.unwrap_or_else(|| vec![PLACEHOLDER_QUALITY; seq.len()]);
        debug_assert_eq!(seq.len(), qual.len());
        match sep {
            Some(sep) if sep != b"+" => {
                self.inner.write_all(b"@")?;
                self.inner.write_all(&head)?;
                self.inner.write_all(b"\n")?;
                self.inner.write_all(&seq)?;
                self.inner.write_all(b"\n")?;
                self.inner.write_all(&sep)?;
                self.inner.write_all(b"\n")?;
                self.inner.write_all(&qual)?;
                self.inner.write_all(b"\n")
            }
            _ => seq_io::fastq::write_to(&mut self.inner, &head, &seq, &qual),
        }
    }
}

/// Writes two line FASTA records.
pub struct FastaWriter<W> {
    inner: W,
    name_prefix: String,
}

impl<W: Write> FastaWriter<W> {
    pub fn new(inner: W, name_prefix: &str) -> Self {
        Self { inner, name_prefix: name_prefix.to_string() }
    }

    fn write(&mut self, record: Record, index: usize) -> io::Result<()> {
        let head = header_or_default(record.head, b'>', &self.name_prefix, index);
        seq_io::fasta::write_to(&mut self.inner, &head, &record.seq)
    }
}

/// Writes one sequence per line.
pub struct RawWriter<W> {
    inner: W,
}

impl<W: Write> RawWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    fn write(&mut self, record: &Record) -> io::Result<()> {
        self.inner.write_all(&record.seq)?;
        self.inner.write_all(b"\n")
    }
}

/// A writer for one of the supported [`Format`]s, chosen once when the output is opened.
pub enum RecordWriter<W> {
    Fastq(FastqWriter<W>),
    Fasta(FastaWriter<W>),
    Raw(RawWriter<W>),
}

impl<W: Write> RecordWriter<W> {
    /// Create the writer for `format`, synthesized read names start with `name_prefix`.
    pub fn new(format: Format, inner: W, name_prefix: &str) -> Self {
        match format {
            Format::Fastq => RecordWriter::Fastq(FastqWriter::new(inner, name_prefix)),
            Format::Fasta => RecordWriter::Fasta(FastaWriter::new(inner, name_prefix)),
            Format::Raw => RecordWriter::Raw(RawWriter::new(inner)),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            RecordWriter::Fastq(_) => Format::Fastq,
            RecordWriter::Fasta(_) => Format::Fasta,
            RecordWriter::Raw(_) => Format::Raw,
        }
    }

    /// Append `record` to the output, `index` is its 1-based position among written reads.
    pub fn write(&mut self, record: Record, index: usize) -> io::Result<()> {
        match self {
            RecordWriter::Fastq(w) => w.write(record, index),
            RecordWriter::Fasta(w) => w.write(record, index),
            RecordWriter::Raw(w) => w.write(&record),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.get_mut().flush()
    }

    pub fn get_mut(&mut self) -> &mut W {
        match self {
            RecordWriter::Fastq(w) => &mut w.inner,
            RecordWriter::Fasta(w) => &mut w.inner,
            RecordWriter::Raw(w) => &mut w.inner,
        }
    }

    /// Consume the writer, returning the underlying stream.
    pub fn into_inner(self) -> W {
        match self {
            RecordWriter::Fastq(w) => w.inner,
            RecordWriter::Fasta(w) => w.inner,
            RecordWriter::Raw(w) => w.inner,
        }
    }
}
