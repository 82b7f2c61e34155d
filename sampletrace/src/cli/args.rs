//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use super::{OutputFormat, ReportOptions};

/// Output file used by `--protobuf` when `-o` isn't given
pub const DEFAULT_PROTOBUF_OUTPUT: &str = "report_sample.trace";

#[derive(Parser, Debug)]
#[command(
    name = "sampletrace",
    version,
    about = "Report samples of a record file as text or as a binary stream",
    after_help = "\
EXAMPLES:
    sampletrace -i perf.data.json                        Text report on stdout
    sampletrace --protobuf --show-callchain              Binary report in report_sample.trace
    sampletrace --dump-protobuf-report report_sample.trace   Dump and verify a binary report"
)]
pub struct Args {
    /// Record file to report (JSON lines)
    #[arg(short, long, value_name = "FILE", default_value = "perf.data.json")]
    pub input: PathBuf,

    /// Report file (default: stdout, or report_sample.trace with --protobuf)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the binary stream format instead of text
    #[arg(long)]
    pub protobuf: bool,

    /// Report full call chains instead of the sampled frame only
    #[arg(long)]
    pub show_callchain: bool,

    /// Drop kernel frames when kernel symbols weren't available at record time
    #[arg(long)]
    pub remove_unknown_kernel_symbols: bool,

    /// Keep interpreter frames around interpreted methods
    #[arg(long)]
    pub show_art_frames: bool,

    /// Dump a binary report as text and verify its ids, then exit
    #[arg(long, value_name = "FILE")]
    pub dump_protobuf_report: Option<PathBuf>,
}

impl Args {
    #[must_use]
    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            format: if self.protobuf { OutputFormat::Protobuf } else { OutputFormat::Text },
            show_callchain: self.show_callchain,
            remove_unknown_kernel_symbols: self.remove_unknown_kernel_symbols,
            show_art_frames: self.show_art_frames,
        }
    }

    /// Where to write the report; `None` means stdout
    #[must_use]
    pub fn output_path(&self) -> Option<PathBuf> {
        self.output
            .clone()
            .or_else(|| self.protobuf.then(|| PathBuf::from(DEFAULT_PROTOBUF_OUTPUT)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["sampletrace"]).unwrap();
        assert_eq!(args.input, PathBuf::from("perf.data.json"));
        assert_eq!(args.output_path(), None);
        assert_eq!(args.report_options(), ReportOptions::default());
    }

    #[test]
    fn test_protobuf_defaults_output_file() {
        let args = Args::try_parse_from(["sampletrace", "--protobuf"]).unwrap();
        assert_eq!(args.output_path(), Some(PathBuf::from("report_sample.trace")));

        let args = Args::try_parse_from(["sampletrace", "--protobuf", "-o", "out.trace"]).unwrap();
        assert_eq!(args.output_path(), Some(PathBuf::from("out.trace")));
    }

    #[test]
    fn test_flags_map_to_options() {
        let args = Args::try_parse_from([
            "sampletrace",
            "--protobuf",
            "--show-callchain",
            "--remove-unknown-kernel-symbols",
            "--show-art-frames",
        ])
        .unwrap();
        let options = args.report_options();
        assert_eq!(options.format, OutputFormat::Protobuf);
        assert!(options.show_callchain);
        assert!(options.remove_unknown_kernel_symbols);
        assert!(options.show_art_frames);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        assert!(Args::try_parse_from(["sampletrace", "--no-such-flag"]).is_err());
    }
}
