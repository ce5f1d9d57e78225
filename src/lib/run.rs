use std::io::{self, Write};

use anyhow::{ensure, Context, Result};
use log::{debug, error, info};

use crate::{
    metrics::RunCounters,
    opts::Opts,
    pipeline::Pipeline,
    reader::RecordReader,
    utils::{built_info, is_standard_stream, open_input, OutputSink},
    writer::RecordWriter,
};

/// Run trimming and filtering, returning the counters of the completed run.
pub fn run(opts: Opts) -> Result<RunCounters> {
    info!("Running version {}", built_info::VERSION.as_str());

    // Preflight checks
    ensure!(
        opts.compression_level <= 9,
        "Compression level must be between 0 and 9, found {}",
        opts.compression_level
    );
    let trim_mode = opts.trim_mode()?;
    let filter = opts.filter_params();
    let input_format = opts.input_format()?;
    let output_format = opts.output_format()?;
    debug!("Trimming with {:?}", trim_mode);
    debug!("Keeping reads starting with {} of length {}", filter.first_bases, filter.size_range);

    let reader = RecordReader::new(input_format, open_input(&opts.infile)?);
    info!("Reading {} records from {}", reader.format(), opts.infile.to_string_lossy());
    let sink = OutputSink::create(&opts.output, opts.compression_threads, opts.compression_level)?;
    let writer = RecordWriter::new(output_format, sink, &opts.name_prefix);
    info!("Writing {} records to {}", writer.format(), opts.output.to_string_lossy());

    info!("Processing reads");
    let mut pipeline = Pipeline::new(reader, writer, trim_mode, filter);
    let counters = match pipeline.run() {
        Ok(counters) => counters,
        Err(failure) => {
            error!(
                "Stopped after reading {} and writing {} reads",
                failure.counters.input_count, failure.counters.output_count
            );
            return Err(failure).with_context(|| {
                format!("Failed to process reads from {}", opts.infile.to_string_lossy())
            });
        }
    };
    pipeline.into_writer().finish()?;

    // Records written to stdout move the summary to stderr
    let summary = if is_standard_stream(&opts.output) {
        write_summary(&mut io::stderr().lock(), &counters, trim_mode.is_iterative())
    } else {
        write_summary(&mut io::stdout().lock(), &counters, trim_mode.is_iterative())
    };
    summary.context("Failed to write the run summary")?;
    info!("Discarded {} reads", counters.discarded_count());

    if let Some(metrics) = &opts.metrics {
        info!("Writing metrics to {}", metrics.to_string_lossy());
        counters.write_metrics_file(metrics)?;
    }
    Ok(counters)
}

/// Write the human readable run summary.
fn write_summary<W: Write>(out: &mut W, counters: &RunCounters, iterative: bool) -> io::Result<()> {
    writeln!(out, "Input reads: {}", counters.input_count)?;
    if iterative {
        writeln!(out, "Nucleotides trimmed: {}", counters.trimmed_nucleotide_count)?;
    }
    writeln!(out, "Output reads: {}", counters.output_count)?;
    out.flush()
}

#[cfg(test)]
mod test {
    use std::{
        path::{Path, PathBuf},
        str::FromStr,
    };

    use fgoxide::io::DelimFile;
    use rstest::rstest;
    use tempfile::tempdir;

    use crate::{
        filter::{FirstBases, SizeRange, SmallRnaClass},
        format::Format,
        metrics::RunCounters,
        pipeline::{PipelineError, PipelineFailure},
        reader::ReadError,
        trim::TrimConfigError,
        utils::test_commons::{
            fastq_lines, slurp_lines, write_gzipped_lines_to_file, write_lines_to_file,
        },
    };

    use super::{run, write_summary, Opts};

    const G20: &str = "GGGGGGGGGGGGGGGGGGGG";
    const T21: &str = "TGGGGGGGGGGGGGGGGGGGG";

    fn fastq_input(dir: &Path, name: &str) -> PathBuf {
        let lines = fastq_lines(&[
            ("r1", "GGGGGGGGGGGGGGGGGGGGAAA"),
            ("r2", "CCCCAAAA"),
            ("r3", "TGGGGGGGGGGGGGGGGGGGG"),
            ("r4", "NGGGGGGGGGGGGGGGGGGGG"),
        ]);
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        write_lines_to_file(dir, name, &lines)
    }

    #[rstest]
    fn test_run_end_to_end(
        #[values("in.fastq", "in.fq.gz")] input: &str,
        #[values("out.fastq", "out.fq.gz")] output: &str,
    ) {
        let dir = tempdir().unwrap();
        let infile = fastq_input(dir.path(), input);
        let outfile = dir.path().join(output);
        let opts = Opts { infile, output: outfile.clone(), trim_a: true, ..Opts::default() };

        let counters = run(opts).unwrap();
        assert_eq!(
            counters,
            RunCounters { input_count: 4, output_count: 2, trimmed_nucleotide_count: 7 }
        );
        assert_eq!(
            slurp_lines(&outfile),
            vec![
                "@r1",
                G20,
                "+",
                "IIIIIIIIIIIIIIIIIIII",
                "@r3",
                T21,
                "+",
                "IIIIIIIIIIIIIIIIIIIII"
            ]
        );
    }

    #[rstest]
    #[case("IN.FQ.GZ")]
    #[case("in.Fastq.Gz")]
    fn test_run_reads_gzip_input_with_any_case_suffix(#[case] name: &str) {
        let dir = tempdir().unwrap();
        let lines = fastq_lines(&[("r1", G20), ("r2", T21)]);
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let infile = write_gzipped_lines_to_file(dir.path(), name, &lines);
        let outfile = dir.path().join("out.txt");
        let opts = Opts { infile, output: outfile.clone(), ..Opts::default() };
        let counters = run(opts).unwrap();
        assert_eq!(
            counters,
            RunCounters { input_count: 2, output_count: 2, trimmed_nucleotide_count: 0 }
        );
        assert_eq!(slurp_lines(&outfile), vec![G20, T21]);
    }

    #[rstest]
    #[case(true, "Input reads: 4\nNucleotides trimmed: 7\nOutput reads: 2\n")]
    #[case(false, "Input reads: 4\nOutput reads: 2\n")]
    fn test_write_summary(#[case] iterative: bool, #[case] expected: &str) {
        let counters = RunCounters { input_count: 4, output_count: 2, trimmed_nucleotide_count: 7 };
        let mut out = Vec::new();
        write_summary(&mut out, &counters, iterative).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_run_to_standard_output() {
        let dir = tempdir().unwrap();
        let infile = write_lines_to_file(dir.path(), "in.txt", &["TTTT"]);
        let opts = Opts {
            infile,
            output: "-".into(),
            output_format: Some(Format::Raw),
            ..Opts::default()
        };
        let counters = run(opts).unwrap();
        assert_eq!(
            counters,
            RunCounters { input_count: 1, output_count: 0, trimmed_nucleotide_count: 0 }
        );
    }

    #[rstest]
    #[case("out.fa", vec![">r1", G20, ">r3", T21])]
    #[case("out.txt", vec![G20, T21])]
    #[case("out.txt.gz", vec![G20, T21])]
    fn test_run_converts_format(#[case] output: &str, #[case] expected: Vec<&str>) {
        let dir = tempdir().unwrap();
        let infile = fastq_input(dir.path(), "in.fq");
        let outfile = dir.path().join(output);
        let opts = Opts { infile, output: outfile.clone(), trim_a: true, ..Opts::default() };
        run(opts).unwrap();
        assert_eq!(slurp_lines(&outfile), expected);
    }

    #[test]
    fn test_run_raw_to_fastq_with_name_prefix() {
        let dir = tempdir().unwrap();
        let infile = write_lines_to_file(dir.path(), "in.txt", &["AAAA", G20, T21]);
        let outfile = dir.path().join("out.fq");
        let opts = Opts {
            infile,
            output: outfile.clone(),
            name_prefix: String::from("read"),
            ..Opts::default()
        };
        let counters = run(opts).unwrap();
        assert_eq!(counters.output_count, 2);
        assert_eq!(
            slurp_lines(&outfile),
            vec![
                "@read_1",
                G20,
                "+",
                "IIIIIIIIIIIIIIIIIIII",
                "@read_2",
                T21,
                "+",
                "IIIIIIIIIIIIIIIIIIIII"
            ]
        );
    }

    #[test]
    fn test_run_with_preset_and_single_trim() {
        let dir = tempdir().unwrap();
        let g22a = "GAAAAAAAAAAAAAAAAAAAAAA";
        let infile = write_lines_to_file(dir.path(), "in.txt", &[g22a, "GAAAAAAAAAAAAAAAAAAAAAC", G20]);
        let outfile = dir.path().join("out.txt");
        let opts = Opts {
            infile,
            output: outfile.clone(),
            trim_single: Some('A'),
            preset: Some(SmallRnaClass::G22),
            ..Opts::default()
        };
        let counters = run(opts).unwrap();
        assert_eq!(
            counters,
            RunCounters { input_count: 3, output_count: 1, trimmed_nucleotide_count: 0 }
        );
        assert_eq!(slurp_lines(&outfile), vec![&g22a[..22]]);
    }

    #[test]
    fn test_run_with_custom_filter() {
        let dir = tempdir().unwrap();
        let infile = write_lines_to_file(dir.path(), "in.txt", &["CC", "ACGTACGT", "TTTTT", G20]);
        let outfile = dir.path().join("out.txt");
        let opts = Opts {
            infile,
            output: outfile.clone(),
            filter: FirstBases::from_str("A,T").unwrap(),
            size: SizeRange { min: 3, max: 8 },
            ..Opts::default()
        };
        let counters = run(opts).unwrap();
        assert_eq!(counters.output_count, 2);
        assert_eq!(slurp_lines(&outfile), vec!["ACGTACGT", "TTTTT"]);
    }

    #[test]
    fn test_run_writes_metrics() {
        let dir = tempdir().unwrap();
        let infile = fastq_input(dir.path(), "in.fq");
        let outfile = dir.path().join("out.fa");
        let metrics = dir.path().join("metrics.tsv");
        let opts = Opts {
            infile,
            output: outfile,
            trim: Some('A'),
            metrics: Some(metrics.clone()),
            ..Opts::default()
        };
        let counters = run(opts).unwrap();
        let read: Vec<RunCounters> = DelimFile::default().read_tsv(&metrics).unwrap();
        assert_eq!(read, vec![counters]);
    }

    #[test]
    fn test_run_fails_on_unsupported_input_name() {
        let dir = tempdir().unwrap();
        let infile = write_lines_to_file(dir.path(), "in.csv", &[G20]);
        let outfile = dir.path().join("out.txt");
        let opts = Opts { infile, output: outfile.clone(), ..Opts::default() };
        let err = run(opts).unwrap_err();
        assert!(format!("{:#}", err).contains("Unsupported file format"));
        assert!(!outfile.exists());
    }

    #[test]
    fn test_run_fails_on_unsupported_output_name() {
        let dir = tempdir().unwrap();
        let infile = write_lines_to_file(dir.path(), "in.txt", &[G20]);
        let outfile = dir.path().join("out.bam");
        let opts = Opts { infile, output: outfile.clone(), ..Opts::default() };
        assert!(run(opts).is_err());
        assert!(!outfile.exists());
    }

    #[test]
    fn test_run_requires_format_for_standard_input() {
        let dir = tempdir().unwrap();
        let opts =
            Opts { infile: "-".into(), output: dir.path().join("out.txt"), ..Opts::default() };
        let err = run(opts).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to determine the input format"));
    }

    #[test]
    fn test_run_rejects_conflicting_trim_modes() {
        let dir = tempdir().unwrap();
        let infile = write_lines_to_file(dir.path(), "in.txt", &[G20]);
        let opts = Opts {
            infile,
            output: dir.path().join("out.txt"),
            trim_a: true,
            trim_single: Some('A'),
            ..Opts::default()
        };
        let err = run(opts).unwrap_err();
        assert_eq!(err.downcast_ref::<TrimConfigError>(), Some(&TrimConfigError::Conflicting));
    }

    #[test]
    fn test_run_rejects_bad_compression_level() {
        let dir = tempdir().unwrap();
        let infile = write_lines_to_file(dir.path(), "in.txt", &[G20]);
        let opts = Opts {
            infile,
            output: dir.path().join("out.txt.gz"),
            compression_level: 12,
            ..Opts::default()
        };
        assert!(run(opts).is_err());
    }

    #[test]
    fn test_run_reports_partial_counters_on_malformed_input() {
        let dir = tempdir().unwrap();
        let mut lines = fastq_lines(&[("r1", G20)]);
        lines.extend(["r2", G20, "+", "IIIIIIIIIIIIIIIIIIII"].iter().map(|s| s.to_string()));
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let infile = write_lines_to_file(dir.path(), "in.fastq", &lines);
        let opts = Opts {
            infile,
            output: dir.path().join("out.txt"),
            input_format: Some(Format::Fastq),
            ..Opts::default()
        };
        let err = run(opts).unwrap_err();
        let failure = err.downcast_ref::<PipelineFailure>().unwrap();
        assert_eq!(failure.counters.input_count, 1);
        assert_eq!(failure.counters.output_count, 1);
        assert!(format!("{:#}", err).contains("in.fastq"));
        assert!(matches!(
            failure.source,
            PipelineError::Read(ReadError::MissingHeaderPrefix { record: 2, .. })
        ));
    }
}
