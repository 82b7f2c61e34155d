use std::io::{self, Write};

use crate::export::{write_indented, StreamRecord};

/// Renders decoded records as indented text
///
/// Samples are numbered from 1 within one dump.
pub struct DumpRenderer<W: Write> {
    out: W,
    samples: usize,
}

impl<W: Write> DumpRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, samples: 0 }
    }

    /// # Errors
    /// Returns an error if writing fails
    pub fn write_header(&mut self, magic: &str, version: u16) -> io::Result<()> {
        write_indented(&mut self.out, 0, format_args!("magic: {magic}"))?;
        write_indented(&mut self.out, 0, format_args!("version: {version}"))
    }

    /// # Errors
    /// Returns an error if writing fails
    pub fn write_record(&mut self, record: &StreamRecord) -> io::Result<()> {
        let out = &mut self.out;
        match record {
            StreamRecord::Sample(sample) => {
                self.samples += 1;
                write_indented(out, 0, format_args!("sample {}:", self.samples))?;
                write_indented(out, 1, format_args!("event_type_id: {}", sample.event_type_id))?;
                write_indented(out, 1, format_args!("time: {}", sample.time))?;
                write_indented(out, 1, format_args!("event_count: {}", sample.event_count))?;
                write_indented(out, 1, format_args!("thread_id: {}", sample.thread_id))?;
                write_indented(out, 1, format_args!("callchain:"))?;
                for entry in &sample.callchain {
                    write_indented(out, 2, format_args!("vaddr_in_file: {:x}", entry.vaddr_in_file))?;
                    write_indented(out, 2, format_args!("file_id: {}", entry.file_id))?;
                    write_indented(out, 2, format_args!("symbol_id: {}", entry.symbol_id))?;
                }
            }
            StreamRecord::Lost(lost) => {
                write_indented(out, 0, format_args!("lost_situation:"))?;
                write_indented(out, 1, format_args!("sample_count: {}", lost.sample_count))?;
                write_indented(out, 1, format_args!("lost_count: {}", lost.lost_count))?;
            }
            StreamRecord::File(file) => {
                write_indented(out, 0, format_args!("file:"))?;
                write_indented(out, 1, format_args!("id: {}", file.id))?;
                write_indented(out, 1, format_args!("path: {}", file.path))?;
                for symbol in &file.symbols {
                    write_indented(out, 1, format_args!("symbol: {symbol}"))?;
                }
                for symbol in &file.mangled_symbols {
                    write_indented(out, 1, format_args!("mangled_symbol: {symbol}"))?;
                }
            }
            StreamRecord::Thread(thread) => {
                write_indented(out, 0, format_args!("thread:"))?;
                write_indented(out, 1, format_args!("thread_id: {}", thread.thread_id))?;
                write_indented(out, 1, format_args!("process_id: {}", thread.process_id))?;
                write_indented(out, 1, format_args!("thread_name: {}", thread.thread_name))?;
            }
            StreamRecord::MetaInfo(meta) => {
                write_indented(out, 0, format_args!("meta_info:"))?;
                for event_type in &meta.event_types {
                    write_indented(out, 1, format_args!("event_type: {event_type}"))?;
                }
                if let Some(name) = &meta.app_package_name {
                    write_indented(out, 1, format_args!("app_package_name: {name}"))?;
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

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
    use crate::domain::{FileId, SymbolId};
    use crate::export::{CallChainEntry, FileTableEntry, ReportSample};

    #[test]
    fn test_samples_are_numbered() {
        let sample = StreamRecord::Sample(ReportSample {
            time: 5,
            thread_id: 3,
            event_count: 9,
            event_type_id: 0,
            callchain: vec![CallChainEntry {
                vaddr_in_file: 0xff,
                file_id: FileId(0),
                symbol_id: SymbolId::UNRESOLVED,
            }],
        });
        let mut renderer = DumpRenderer::new(Vec::new());
        renderer.write_record(&sample).unwrap();
        renderer.write_record(&sample).unwrap();
        assert_eq!(renderer.samples(), 2);

        let text = String::from_utf8(renderer.finish().unwrap()).unwrap();
        assert!(text.starts_with("sample 1:\n  event_type_id: 0\n  time: 5\n"));
        assert!(text.contains("sample 2:\n"));
        assert!(text.contains("    vaddr_in_file: ff\n    file_id: 0\n    symbol_id: -1\n"));
    }

    #[test]
    fn test_file_lists_both_symbol_names() {
        let file = StreamRecord::File(FileTableEntry {
            id: FileId(0),
            path: "/data/app/libapp.so".to_string(),
            symbols: vec!["main()".to_string()],
            mangled_symbols: vec!["_Z4mainv".to_string()],
        });
        let mut renderer = DumpRenderer::new(Vec::new());
        renderer.write_record(&file).unwrap();
        let text = String::from_utf8(renderer.finish().unwrap()).unwrap();
        assert_eq!(
            text,
            "file:\n  id: 0\n  path: /data/app/libapp.so\n  symbol: main()\n  mangled_symbol: _Z4mainv\n"
        );
    }
}
