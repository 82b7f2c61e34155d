//! # Event Processing
//!
//! Consumes raw records in file order and writes the report as it goes.
//!
//! ## Record Routing
//!
//! - `comm` / `mmap` → [`ThreadTree`] (thread names, address spaces)
//! - `sample` → [`CallChainResolver`] → report output
//! - `lost` → [`LostEventAccumulator`]
//!
//! ## Output Modes
//!
//! - **Text**: every sample is written with file paths and symbol names inline
//! - **Protobuf**: samples carry file/symbol ids from a [`ReferenceTable`];
//!   the lost summary, file table and thread table follow the last sample

use log::{debug, info};
use std::io::{BufRead, Write};

use super::{CallChain, CallChainResolver, LostEventAccumulator};
use crate::cli::{OutputFormat, ReportOptions};
use crate::domain::ReportError;
use crate::export::{
    BinaryStreamEncoder, CallChainEntry, MetaInfo, ReferenceTable, ReportSample, StreamRecord,
    TextFrame, TextReportWriter, TextSample, ThreadInfoEntry,
};
use crate::record::{RawRecord, RecordFileHeader, RecordFileReader, SampleRecord};
use crate::symbolization::{AddressResolver, Dso, Symbol, ThreadTree};

/// Thread entry points ending every complete call chain
const THREAD_ENTRY_POINTS: [&str; 2] = ["__libc_init", "__start_thread"];
const LIBC_FILE_NAME: &str = "libc.so";

/// Totals of one report run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub records: usize,
    pub samples: u64,
    pub lost: u64,
    /// Samples with nothing left to report after call chain resolution
    pub skipped_samples: usize,
    /// Files in the file table (protobuf output only)
    pub files: usize,
    pub threads: usize,
}

enum ReportOutput<W: Write> {
    Binary { encoder: BinaryStreamEncoder<W>, references: ReferenceTable },
    Text(TextReportWriter<W>),
}

/// Encapsulates report state for one record file
pub struct EventProcessor<W: Write> {
    header: RecordFileHeader,
    thread_tree: ThreadTree,
    resolver: CallChainResolver,
    lost: LostEventAccumulator,
    output: ReportOutput<W>,
    records: usize,
    skipped_samples: usize,
}

impl<W: Write> EventProcessor<W> {
    /// Create a processor and write the meta info record
    ///
    /// # Errors
    /// Returns an error if writing the report head fails
    pub fn start(
        options: &ReportOptions,
        header: RecordFileHeader,
        thread_tree: ThreadTree,
        writer: W,
    ) -> Result<Self, ReportError> {
        let meta = MetaInfo {
            event_types: header.event_types.clone(),
            app_package_name: header.app_package_name().map(str::to_string),
        };
        let output = match options.format {
            OutputFormat::Protobuf => {
                let mut encoder = BinaryStreamEncoder::new(writer);
                encoder.write_header()?;
                encoder.write_record(&StreamRecord::MetaInfo(meta))?;
                ReportOutput::Binary { encoder, references: ReferenceTable::new() }
            }
            OutputFormat::Text => {
                let mut text = TextReportWriter::new(writer);
                text.write_meta_info(&meta, header.trace_offcpu())?;
                ReportOutput::Text(text)
            }
        };
        let resolver =
            CallChainResolver::new(options.callchain_options(header.kernel_symbols_available()));

        Ok(Self {
            header,
            thread_tree,
            resolver,
            lost: LostEventAccumulator::new(),
            output,
            records: 0,
            skipped_samples: 0,
        })
    }

    /// Process a single record
    ///
    /// # Errors
    /// Returns an error if a sample names an unknown event type or writing fails
    pub fn process_record(&mut self, record: &RawRecord) -> Result<(), ReportError> {
        self.records += 1;
        self.thread_tree.update(record);
        match record {
            RawRecord::Comm(_) | RawRecord::Mmap(_) => {}
            RawRecord::Sample(sample) => self.process_sample(sample)?,
            RawRecord::Lost(lost) => self.lost.record_lost(lost.lost),
        }
        Ok(())
    }

    fn process_sample(&mut self, sample: &SampleRecord) -> Result<(), ReportError> {
        let (ips, kernel_ip_count) = sample.call_chain();
        let Some(chain) = self.resolver.resolve(&self.thread_tree, sample.pid(), ips, kernel_ip_count)
        else {
            self.skipped_samples += 1;
            return Ok(());
        };
        let count = self.header.event_types.len();
        let Some(event_type) = self.header.event_types.get(sample.event_type_index) else {
            return Err(ReportError::UnknownEventType { index: sample.event_type_index, count });
        };
        self.lost.record_sample();
        self.thread_tree.find_thread_or_new(sample.pid(), sample.tid());

        let tree = &self.thread_tree;
        match &mut self.output {
            ReportOutput::Binary { encoder, references } => {
                let record = binary_sample(tree, references, sample, &chain);
                encoder.write_record(&StreamRecord::Sample(record))?;
            }
            ReportOutput::Text(text) => {
                let thread_name = tree.thread(sample.tid()).map_or("", |t| t.comm.as_str());
                let frames = chain
                    .entries
                    .iter()
                    .map(|entry| {
                        let dso = tree.dso(entry.dso);
                        let symbol = entry.symbol.map_or_else(
                            || format!("{}[+{:x}]", dso.file_name(), entry.vaddr_in_file),
                            |index| dso.symbol(index).demangled.clone(),
                        );
                        TextFrame { vaddr_in_file: entry.vaddr_in_file, file: dso.path(), symbol }
                    })
                    .collect();
                text.write_sample(&TextSample {
                    event_type,
                    time: sample.time,
                    event_count: sample.period,
                    thread_id: sample.tid,
                    thread_name,
                    frames,
                })?;
            }
        }
        Ok(())
    }

    /// Write the trailing records and flush
    ///
    /// # Errors
    /// Returns an error if writing fails
    pub fn finish(self) -> Result<ReportSummary, ReportError> {
        let counters = self.lost.counters();
        let mut summary = ReportSummary {
            records: self.records,
            samples: counters.sample_count,
            lost: counters.lost_count,
            skipped_samples: self.skipped_samples,
            files: 0,
            threads: 0,
        };

        match self.output {
            ReportOutput::Binary { mut encoder, references } => {
                encoder.write_record(&StreamRecord::Lost(counters))?;
                for file in references.file_table() {
                    encoder.write_record(&StreamRecord::File(file))?;
                    summary.files += 1;
                }
                for thread in self.thread_tree.threads() {
                    encoder.write_record(&StreamRecord::Thread(ThreadInfoEntry {
                        thread_id: thread.tid.0,
                        process_id: thread.pid.0,
                        thread_name: thread.comm.clone(),
                    }))?;
                    summary.threads += 1;
                }
                encoder.finish()?;
            }
            ReportOutput::Text(mut text) => {
                text.write_lost_situation(counters)?;
                text.finish()?;
            }
        }

        info!(
            "Reported {} samples ({} lost, {} skipped) from {} records",
            summary.samples, summary.lost, summary.skipped_samples, summary.records
        );
        Ok(summary)
    }
}

/// Convert a resolved chain into a stream sample, assigning ids as needed
///
/// The chain is cut after the thread entry point so readers can tell a
/// complete chain from a truncated one.
fn binary_sample(
    tree: &ThreadTree,
    references: &mut ReferenceTable,
    sample: &SampleRecord,
    chain: &CallChain,
) -> ReportSample {
    let mut callchain = Vec::with_capacity(chain.entries.len());
    for entry in &chain.entries {
        let dso = tree.dso(entry.dso);
        let symbol = entry.symbol.map(|index| dso.symbol(index));
        let file_id = references.file_id_for(dso.path());
        let symbol_id = references.symbol_id_for(file_id, symbol);
        callchain.push(CallChainEntry { vaddr_in_file: entry.vaddr_in_file, file_id, symbol_id });
        if is_thread_entry_point(dso, symbol) {
            break;
        }
    }

    // Wire thread ids are int32; kernel tids stay below 2^22.
    #[allow(clippy::cast_possible_wrap)]
    let thread_id = sample.tid as i32;
    ReportSample {
        time: sample.time,
        thread_id,
        event_count: sample.period,
        event_type_id: u32::try_from(sample.event_type_index).unwrap_or(u32::MAX),
        callchain,
    }
}

fn is_thread_entry_point(dso: &Dso, symbol: Option<&Symbol>) -> bool {
    dso.file_name() == LIBC_FILE_NAME
        && symbol.is_some_and(|symbol| THREAD_ENTRY_POINTS.contains(&symbol.name.as_str()))
}

/// Report every record of `reader` to `writer`
///
/// # Errors
/// Returns the first input, resolution or output failure
pub fn generate_report<R: BufRead, W: Write>(
    reader: RecordFileReader<R>,
    options: &ReportOptions,
    writer: W,
) -> Result<ReportSummary, ReportError> {
    let (header, records) = reader.into_parts();
    let thread_tree = ThreadTree::with_declarations(&header.dsos);
    debug!("Reporting with {options:?}");

    let mut processor = EventProcessor::start(options, header, thread_tree, writer)?;
    for record in records {
        processor.process_record(&record?)?;
    }
    processor.finish()
}
