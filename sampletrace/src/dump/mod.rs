//! Offline dump of a binary report stream
//!
//! Decodes a stream written by `--protobuf`, renders every record as text
//! and checks that the ids in samples resolve against the file records:
//!
//! ```text
//! BinaryStreamDecoder ──► DumpRenderer (text)
//!          │
//!          └────────────► ReferenceValidator ──► finish() after the terminator
//! ```

pub mod decoder;
pub mod render;
pub mod validator;

pub use decoder::{BinaryStreamDecoder, RecordSizeLimit};
pub use render::DumpRenderer;
pub use validator::ReferenceValidator;

use log::info;
use sampletrace_common::MAGIC;
use std::io::{Read, Write};

use crate::domain::StreamError;
use crate::export::{LostCounters, MetaInfo, StreamRecord};

/// What a dumped stream contained
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub version: u16,
    pub samples: usize,
    pub lost: Option<LostCounters>,
    /// Symbol count per file, indexed by file id
    pub file_symbol_counts: Vec<u32>,
    pub threads: usize,
    pub meta_info: Option<MetaInfo>,
}

/// Decode, render and validate the stream read from `reader`
///
/// # Errors
/// Returns the first format or integrity violation, or an I/O failure of
/// either side
pub fn dump_report<R: Read, W: Write>(reader: R, out: W) -> Result<DumpSummary, StreamError> {
    let mut decoder = BinaryStreamDecoder::new(reader);
    let mut renderer = DumpRenderer::new(out);
    let mut validator = ReferenceValidator::new();

    let version = decoder.read_header()?;
    renderer.write_header(&String::from_utf8_lossy(MAGIC), version)?;
    let mut summary = DumpSummary { version, ..DumpSummary::default() };

    while let Some(record) = decoder.read_next()? {
        renderer.write_record(&record)?;
        validator.observe(&record)?;
        match record {
            StreamRecord::Sample(_) | StreamRecord::File(_) => {}
            StreamRecord::Lost(lost) => summary.lost = Some(lost),
            StreamRecord::Thread(_) => summary.threads += 1,
            StreamRecord::MetaInfo(meta) => summary.meta_info = Some(meta),
        }
    }
    validator.finish()?;

    summary.samples = renderer.samples();
    summary.file_symbol_counts = validator.symbol_counts().to_vec();
    renderer.finish()?;
    info!(
        "Dumped {} samples, {} files, {} threads",
        summary.samples,
        summary.file_symbol_counts.len(),
        summary.threads
    );
    Ok(summary)
}
