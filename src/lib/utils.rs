//! Utility functions.
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Stdout, Write},
    path::Path,
};

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use gzp::{deflate::Gzip, Compression, ZBuilder, ZWriter, BUFSIZE};

use crate::format::is_gzipped;

/// The path that stands for standard input or standard output.
pub const STANDARD_STREAM: &str = "-";

pub mod built_info {
    use lazy_static::lazy_static;
    include!(concat!(env!("OUT_DIR"), "/built.rs"));

    /// Get a software version string including
    ///   - Git commit hash
    ///   - Git dirty info (whether the repo had uncommitted changes)
    ///   - Cargo package version if no git info found
    fn get_software_version() -> String {
        let prefix = if let Some(s) = GIT_COMMIT_HASH {
            format!("{}-{}", PKG_VERSION, s[0..8].to_owned())
        } else {
            // This shouldn't happen
            PKG_VERSION.to_string()
        };
        let suffix = match GIT_DIRTY {
            Some(true) => "-dirty",
            _ => "",
        };
        format!("{}{}", prefix, suffix)
    }

    lazy_static! {
        /// Version of the software with git hash
        pub static ref VERSION: String = get_software_version();
    }
}

/// True if `path` is `-`.
pub fn is_standard_stream<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().as_os_str() == STANDARD_STREAM
}

/// Open the input for reading.
///
/// `-` reads standard input.  Files whose name ends in `.gz`, in any case, are decompressed while
/// reading.
pub fn open_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    if is_standard_stream(&path) {
        return Ok(Box::new(BufReader::with_capacity(BUFSIZE, io::stdin())));
    }
    let file = File::open(&path)
        .with_context(|| format!("Failed to open {}", path.as_ref().to_string_lossy()))?;
    if is_gzipped(&path) {
        let decoder = MultiGzDecoder::new(BufReader::with_capacity(BUFSIZE, file));
        Ok(Box::new(BufReader::with_capacity(BUFSIZE, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFSIZE, file)))
    }
}

/// The destination of the output records.
pub enum OutputSink {
    /// An uncompressed file.
    Plain(BufWriter<File>),
    /// Standard output, never compressed.
    Stdout(BufWriter<Stdout>),
    /// A gzip compressed file.
    Gzip(Box<dyn ZWriter>),
}

impl OutputSink {
    /// Create the sink for `path`.
    ///
    /// `-` writes to standard output.  Files ending in `.gz` are gzip compressed with
    /// `compression_threads` threads at `compression_level`.
    pub fn create<P: AsRef<Path>>(
        path: P,
        compression_threads: usize,
        compression_level: u32,
    ) -> Result<Self> {
        if is_standard_stream(&path) {
            return Ok(OutputSink::Stdout(BufWriter::with_capacity(BUFSIZE, io::stdout())));
        }
        let file = File::create(&path)
            .with_context(|| format!("Unable to create file: {}", path.as_ref().to_string_lossy()))?;
        let writer = BufWriter::with_capacity(BUFSIZE, file);
        if is_gzipped(&path) {
            let writer = ZBuilder::<Gzip, _>::new()
                .num_threads(compression_threads)
                .compression_level(Compression::new(compression_level))
                .from_writer(writer);
            Ok(OutputSink::Gzip(writer))
        } else {
            Ok(OutputSink::Plain(writer))
        }
    }

    /// Flush all buffered output, finishing the gzip stream if there is one.
    pub fn finish(self) -> Result<()> {
        match self {
            OutputSink::Plain(mut w) => w.flush().context("Failed to flush the output file"),
            OutputSink::Stdout(mut w) => w.flush().context("Failed to flush standard output"),
            OutputSink::Gzip(mut w) => w.finish().context("Failed to finish the compressed output"),
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Plain(w) => w.write(buf),
            OutputSink::Stdout(w) => w.write(buf),
            OutputSink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Plain(w) => w.flush(),
            OutputSink::Stdout(w) => w.flush(),
            OutputSink::Gzip(w) => w.flush(),
        }
    }
}
