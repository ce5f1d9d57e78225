//! The [`Record`] type shared by the reader, trimmer, filter and writer.

/// One sequencing read, however it was framed in its source file.
///
/// Fields are raw bytes with line terminators and header prefixes (`@`, `>`) removed.  When a
/// quality string is present it has the same length as the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    /// The header line without its leading `@` or `>`, absent for raw reads.
    pub head: Option<Vec<u8>>,
    /// The bases of the read.
    pub seq: Vec<u8>,
    /// The FASTQ separator line as read, usually `+`, absent for other formats.
    pub sep: Option<Vec<u8>>,
    /// The per-base qualities, present only for FASTQ reads.
    pub qual: Option<Vec<u8>>,
}

impl Record {
    /// Create a record holding only a sequence.
    pub fn from_seq<S: Into<Vec<u8>>>(seq: S) -> Self {
        Self { head: None, seq: seq.into(), sep: None, qual: None }
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// The last base of the read, if any.
    pub fn last_base(&self) -> Option<u8> {
        self.seq.last().copied()
    }

    /// Consume the record and return one whose sequence and quality are cut to `len` bases,
    /// removing bases from the 3' end.
    ///
    /// Lengths greater than the current length leave the record unchanged.
    #[must_use]
    pub fn truncated(mut self, len: usize) -> Self {
        self.seq.truncate(len);
        if let Some(qual) = self.qual.as_mut() {
            qual.truncate(len);
        }
        self
    }
}
