#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use crate::{
    filter::{
        FilterParams, FirstBases, SizeRange, SmallRnaClass, DEFAULT_FIRST_BASES,
        DEFAULT_SIZE_RANGE,
    },
    format::Format,
    trim::TrimMode,
    utils::built_info,
    writer::DEFAULT_NAME_PREFIX,
};

pub static TOOL_NAME: &str = "srna-filter";

static SHORT_USAGE: &str =
    "Trims and filters small RNA reads by first base and length in FASTQ, FASTA or raw format.";

static LONG_USAGE: &str = "
Trims and filters small RNA reads by first base and length in FASTQ, FASTA or raw format.

The record format of the input and output is detected from the file names:

  - FASTQ: .fastq, .fq
  - FASTA: .fasta, .fa
  - raw (one sequence per line): .txt

Each suffix may be followed by .gz, in which case the file is read or written with gzip
compression.  Use `-` to read from standard input or write to standard output, together with
--input-format or --output-format.

Reads may first be trimmed at their 3' end, either repeatedly removing a base (--trim, --trim-a)
or removing a single trailing base and discarding reads that do not end in it (--trim-single).
Reads are then kept when their length lies within --size and they start with one of the bases
given with --filter.  Missing read names are written as `<name prefix>_<n>` and missing
qualities as `I`.

Example invocation:

srna-filter reads.fastq.gz \\
  --output filtered.fa \\
  --trim-a \\
  --filter G \\
  --size 21,23
";

#[derive(Parser, Debug, Clone)]
#[clap(name = TOOL_NAME, version = built_info::VERSION.as_str(), about=SHORT_USAGE, long_about=LONG_USAGE, term_width=0)]
pub struct Opts {
    /// Path to the input reads, or `-` for standard input.
    #[clap(display_order = 1)]
    pub infile: PathBuf,

    /// Path to write the kept reads to, or `-` for standard output.
    ///
    /// This tool will overwrite an existing file.
    #[clap(long, short = 'o', display_order = 2)]
    pub output: PathBuf,

    /// Comma separated list of the bases a kept read may start with.
    #[clap(long, short = 'f', default_value = DEFAULT_FIRST_BASES, conflicts_with = "preset", display_order = 11)]
    pub filter: FirstBases,

    /// Inclusive range of kept read lengths as `min,max`.
    ///
    /// The max may be `inf` or left empty for no upper bound.
    #[clap(long, short = 's', default_value = DEFAULT_SIZE_RANGE, conflicts_with = "preset", display_order = 11)]
    pub size: SizeRange,

    /// Keep only a well known class of small RNAs.
    ///
    /// - `22g` - 22 nt reads starting with G
    /// - `21u` - 21 nt reads starting with T
    #[clap(long, short = 'p', possible_values = SmallRnaClass::possible_values(), verbatim_doc_comment, display_order = 12)]
    pub preset: Option<SmallRnaClass>,

    /// Repeatedly trim A's from the 3' end of reads, the same as `--trim A`.
    #[clap(long, short = 'a', conflicts_with_all = &["trim", "trim-single"], display_order = 21)]
    pub trim_a: bool,

    /// Repeatedly trim this base from the 3' end of reads.
    #[clap(long, short = 't', conflicts_with = "trim-single", display_order = 21)]
    pub trim: Option<char>,

    /// The minimum length a read is trimmed down to by `--trim` or `--trim-a`.
    #[clap(long, short = 'm', alias = "min_trim_length", default_value = "0", display_order = 21)]
    pub min_trim_length: usize,

    /// Trim a single trailing base from every read, discarding reads that do not end in it.
    #[clap(long, alias = "trim_single", display_order = 22)]
    pub trim_single: Option<char>,

    /// The record format of the input, detected from the file name when not given.
    #[clap(long, possible_values = Format::possible_values(), display_order = 31)]
    pub input_format: Option<Format>,

    /// The record format of the output, detected from the file name when not given.
    #[clap(long, possible_values = Format::possible_values(), display_order = 31)]
    pub output_format: Option<Format>,

    /// The prefix of the names written for reads without one.
    #[clap(long, short = 'n', default_value = DEFAULT_NAME_PREFIX, display_order = 32)]
    pub name_prefix: String,

    /// Path to write the read counts to as a tab separated file.
    #[clap(long, display_order = 41)]
    pub metrics: Option<PathBuf>,

    /// Number of threads for compressing gzip output.
    #[clap(long, default_value = "1", display_order = 51)]
    pub compression_threads: usize,

    /// Compression level for gzip output, from 0 to 9.
    #[clap(long, default_value = "6", display_order = 51)]
    pub compression_level: u32,
}

impl Opts {
    /// Build the [`TrimMode`] from the trimming options.
    pub fn trim_mode(&self) -> Result<TrimMode> {
        let trim = if self.trim_a { Some('A') } else { self.trim };
        let mode = TrimMode::from_options(trim, self.min_trim_length, self.trim_single)?;
        Ok(mode)
    }

    /// The [`FilterParams`] for this run, taken from `--preset` when given.
    pub fn filter_params(&self) -> FilterParams {
        match self.preset {
            Some(preset) => preset.filter_params(),
            None => FilterParams::new(self.filter.clone(), self.size),
        }
    }

    /// The record format of the input.
    pub fn input_format(&self) -> Result<Format> {
        match self.input_format {
            Some(format) => Ok(format),
            None => Format::detect(&self.infile).context("Failed to determine the input format"),
        }
    }

    /// The record format of the output.
    pub fn output_format(&self) -> Result<Format> {
        match self.output_format {
            Some(format) => Ok(format),
            None => Format::detect(&self.output).context("Failed to determine the output format"),
        }
    }
}

/// Implement defaults that match the CLI options to allow for easier testing.
///
/// Note that these defaults exist only within test code.
#[cfg(test)]
impl Default for Opts {
    fn default() -> Self {
        let filter = FilterParams::default();
        Self {
            infile: PathBuf::default(),
            output: PathBuf::default(),
            filter: filter.first_bases,
            size: filter.size_range,
            preset: None,
            trim_a: false,
            trim: None,
            min_trim_length: 0,
            trim_single: None,
            input_format: None,
            output_format: None,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            metrics: None,
            compression_threads: 1,
            compression_level: 6,
        }
    }
}

/// Parse args and set up logging / tracing
pub fn setup() -> Opts {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    Opts::parse()
}

#[cfg(test)]
mod test {
    use std::{path::PathBuf, str::FromStr};

    use clap::{ErrorKind, Parser};
    use rstest::rstest;

    use super::Opts;
    use crate::{
        filter::{FilterParams, FirstBases, SizeRange, SmallRnaClass},
        format::Format,
        trim::{TrimConfigError, TrimMode},
    };

    fn parse(args: &[&str]) -> Result<Opts, clap::Error> {
        Opts::try_parse_from(std::iter::once("srna-filter").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let opts = parse(&["in.fq", "-o", "out.fa"]).unwrap();
        assert_eq!(opts.infile, PathBuf::from("in.fq"));
        assert_eq!(opts.output, PathBuf::from("out.fa"));
        assert_eq!(opts.filter_params(), FilterParams::default());
        assert_eq!(opts.trim_mode().unwrap(), TrimMode::Off);
        assert_eq!(opts.name_prefix, "Seq");
        assert_eq!(opts.input_format().unwrap(), Format::Fastq);
        assert_eq!(opts.output_format().unwrap(), Format::Fasta);
    }

    #[test]
    fn test_filter_options() {
        let opts = parse(&["in.txt", "-o", "out.txt", "-f", "g,t", "-s", "20,"]).unwrap();
        assert_eq!(
            opts.filter_params(),
            FilterParams::new(
                FirstBases::from_str("G,T").unwrap(),
                SizeRange { min: 20, max: usize::MAX }
            )
        );
    }

    #[rstest]
    #[case("22g", SmallRnaClass::G22)]
    #[case("21u", SmallRnaClass::U21)]
    fn test_preset(#[case] value: &str, #[case] expected: SmallRnaClass) {
        let opts = parse(&["in.txt", "-o", "out.txt", "--preset", value]).unwrap();
        assert_eq!(opts.preset, Some(expected));
        assert_eq!(opts.filter_params(), expected.filter_params());
    }

    #[rstest]
    #[case(&["-a"], TrimMode::Iterative { base: b'A', min_retained_length: 0 })]
    #[case(&["--trim-a", "-m", "18"], TrimMode::Iterative { base: b'A', min_retained_length: 18 })]
    #[case(&["-t", "C", "--min_trim_length", "5"], TrimMode::Iterative { base: b'C', min_retained_length: 5 })]
    #[case(&["--trim-single", "A"], TrimMode::SingleShot { base: b'A' })]
    #[case(&["--trim_single", "T"], TrimMode::SingleShot { base: b'T' })]
    fn test_trim_options(#[case] args: &[&str], #[case] expected: TrimMode) {
        let mut all = vec!["in.txt", "-o", "out.txt"];
        all.extend_from_slice(args);
        assert_eq!(parse(&all).unwrap().trim_mode().unwrap(), expected);
    }

    #[rstest]
    #[case(&["-a", "--trim-single", "A"])]
    #[case(&["-t", "A", "--trim-single", "A"])]
    #[case(&["-a", "-t", "C"])]
    #[case(&["--preset", "22g", "-f", "G"])]
    #[case(&["--preset", "21u", "-s", "20,22"])]
    fn test_conflicting_options(#[case] args: &[&str]) {
        let mut all = vec!["in.txt", "-o", "out.txt"];
        all.extend_from_slice(args);
        assert_eq!(parse(&all).unwrap_err().kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_conflicting_trim_modes_are_rejected_without_the_parser() {
        let opts = Opts { trim: Some('A'), trim_single: Some('A'), ..Opts::default() };
        let err = opts.trim_mode().unwrap_err();
        assert_eq!(err.downcast_ref::<TrimConfigError>(), Some(&TrimConfigError::Conflicting));
    }

    #[rstest]
    #[case(&["in.txt", "-o", "out.txt", "-s", "30,18"])]
    #[case(&["in.txt", "-o", "out.txt", "-f", "AT"])]
    #[case(&["in.txt", "-o", "out.txt", "--preset", "23g"])]
    #[case(&["in.txt"])]
    fn test_invalid_options(#[case] args: &[&str]) {
        assert!(parse(args).is_err());
    }

    #[test]
    fn test_format_overrides() {
        let opts = parse(&["-", "-o", "-", "--input-format", "fasta", "--output-format", "raw"])
            .unwrap();
        assert_eq!(opts.input_format().unwrap(), Format::Fasta);
        assert_eq!(opts.output_format().unwrap(), Format::Raw);

        let opts = parse(&["-", "-o", "out.fq"]).unwrap();
        assert!(opts.input_format().is_err());
        assert_eq!(opts.output_format().unwrap(), Format::Fastq);
    }
}
