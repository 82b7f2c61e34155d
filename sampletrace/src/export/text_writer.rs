use std::fmt;
use std::io::{self, Write};

use super::{LostCounters, MetaInfo};

/// Spaces per indent level
const INDENT_WIDTH: usize = 2;

/// Write one line indented by `level` steps
///
/// # Errors
/// Returns an error if writing to `out` fails
pub fn write_indented<W: Write + ?Sized>(
    out: &mut W,
    level: usize,
    line: fmt::Arguments<'_>,
) -> io::Result<()> {
    writeln!(out, "{:width$}{line}", "", width = level * INDENT_WIDTH)
}

/// A frame as shown in a text report: names inline, no ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFrame<'a> {
    pub vaddr_in_file: u64,
    pub file: &'a str,
    /// Demangled name, or `<file name>[+<vaddr>]` for unknown symbols
    pub symbol: String,
}

/// A sample as shown in a text report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSample<'a> {
    pub event_type: &'a str,
    pub time: u64,
    pub event_count: u64,
    pub thread_id: u32,
    pub thread_name: &'a str,
    /// Never empty; the first frame is the sampled one
    pub frames: Vec<TextFrame<'a>>,
}

/// Writes the human-readable report
pub struct TextReportWriter<W: Write> {
    out: W,
}

impl<W: Write> TextReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// # Errors
    /// Returns an error if writing fails
    pub fn write_meta_info(&mut self, meta: &MetaInfo, trace_offcpu: bool) -> io::Result<()> {
        write_indented(&mut self.out, 0, format_args!("meta_info:"))?;
        write_indented(&mut self.out, 1, format_args!("trace_offcpu: {trace_offcpu}"))?;
        for event_type in &meta.event_types {
            write_indented(&mut self.out, 1, format_args!("event_type: {event_type}"))?;
        }
        if let Some(name) = &meta.app_package_name {
            write_indented(&mut self.out, 1, format_args!("app_package_name: {name}"))?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns an error if writing fails
    pub fn write_sample(&mut self, sample: &TextSample<'_>) -> io::Result<()> {
        let out = &mut self.out;
        write_indented(out, 0, format_args!("sample:"))?;
        write_indented(out, 1, format_args!("event_type: {}", sample.event_type))?;
        write_indented(out, 1, format_args!("time: {}", sample.time))?;
        write_indented(out, 1, format_args!("event_count: {}", sample.event_count))?;
        write_indented(out, 1, format_args!("thread_id: {}", sample.thread_id))?;
        write_indented(out, 1, format_args!("thread_name: {}", sample.thread_name))?;

        let Some((top, callers)) = sample.frames.split_first() else {
            return Ok(());
        };
        Self::write_frame(out, 1, top)?;
        if !callers.is_empty() {
            write_indented(out, 1, format_args!("callchain:"))?;
            for frame in callers {
                Self::write_frame(out, 2, frame)?;
            }
        }
        Ok(())
    }

    fn write_frame(out: &mut W, level: usize, frame: &TextFrame<'_>) -> io::Result<()> {
        write_indented(out, level, format_args!("vaddr_in_file: {:x}", frame.vaddr_in_file))?;
        write_indented(out, level, format_args!("file: {}", frame.file))?;
        write_indented(out, level, format_args!("symbol: {}", frame.symbol))
    }

    /// # Errors
    /// Returns an error if writing fails
    pub fn write_lost_situation(&mut self, lost: LostCounters) -> io::Result<()> {
        write_indented(&mut self.out, 0, format_args!("lost_situation:"))?;
        write_indented(&mut self.out, 1, format_args!("sample_count: {}", lost.sample_count))?;
        write_indented(&mut self.out, 1, format_args!("lost_count: {}", lost.lost_count))
    }

    /// Flush and return the sink
    ///
    /// # Errors
    /// Returns an error if flushing fails
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut TextReportWriter<Vec<u8>>) -> io::Result<()>) -> String {
        let mut writer = TextReportWriter::new(Vec::new());
        f(&mut writer).unwrap();
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_indent_is_two_spaces_per_level() {
        let mut out = Vec::new();
        write_indented(&mut out, 2, format_args!("x: {}", 1)).unwrap();
        assert_eq!(out, b"    x: 1\n");
    }

    #[test]
    fn test_meta_info() {
        let meta = MetaInfo {
            event_types: vec!["cpu-cycles".to_string(), "sched:sched_switch".to_string()],
            app_package_name: Some("com.example.app".to_string()),
        };
        let text = render(|w| w.write_meta_info(&meta, true));
        assert_eq!(
            text,
            "meta_info:\n  trace_offcpu: true\n  event_type: cpu-cycles\n  \
             event_type: sched:sched_switch\n  app_package_name: com.example.app\n"
        );
    }

    #[test]
    fn test_sample_with_callchain() {
        let sample = TextSample {
            event_type: "cpu-cycles",
            time: 1000,
            event_count: 250,
            thread_id: 11,
            thread_name: "worker",
            frames: vec![
                TextFrame { vaddr_in_file: 0x1a0, file: "/system/lib64/libc.so", symbol: "read".to_string() },
                TextFrame {
                    vaddr_in_file: 0x44,
                    file: "/data/app/libapp.so",
                    symbol: "libapp.so[+44]".to_string(),
                },
            ],
        };
        let text = render(|w| w.write_sample(&sample));
        let expected = "\
sample:
  event_type: cpu-cycles
  time: 1000
  event_count: 250
  thread_id: 11
  thread_name: worker
  vaddr_in_file: 1a0
  file: /system/lib64/libc.so
  symbol: read
  callchain:
    vaddr_in_file: 44
    file: /data/app/libapp.so
    symbol: libapp.so[+44]
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_single_frame_has_no_callchain_block() {
        let sample = TextSample {
            event_type: "cpu-cycles",
            time: 1,
            event_count: 1,
            thread_id: 1,
            thread_name: "main",
            frames: vec![TextFrame { vaddr_in_file: 0, file: "unknown", symbol: "unknown[+0]".to_string() }],
        };
        assert!(!render(|w| w.write_sample(&sample)).contains("callchain:"));
    }

    #[test]
    fn test_lost_situation() {
        let text = render(|w| w.write_lost_situation(LostCounters { sample_count: 4, lost_count: 2 }));
        assert_eq!(text, "lost_situation:\n  sample_count: 4\n  lost_count: 2\n");
    }
}
