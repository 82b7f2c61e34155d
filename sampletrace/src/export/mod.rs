//! Report output
//!
//! Two interchangeable forms of the same report:
//!
//! - **Binary stream** ([`BinaryStreamEncoder`]): length-prefixed protobuf
//!   records. File paths and symbol names are deduplicated through ids from a
//!   [`ReferenceTable`] and written once, in file records after the samples.
//! - **Text** ([`TextReportWriter`]): indented `key: value` lines with names
//!   written inline on every frame.
//!
//! Record order of a binary stream:
//!
//! ```text
//! header, meta_info, sample*, lost_situation, file* (by id), thread* (by tid), terminator
//! ```

pub mod binary_encoder;
pub mod reference_table;
pub mod stream_record;
pub mod text_writer;

pub use binary_encoder::BinaryStreamEncoder;
pub use reference_table::{ReferenceTable, ReferencedSymbol};
pub use stream_record::{
    CallChainEntry, FileTableEntry, LostCounters, MetaInfo, ReportSample, StreamRecord,
    ThreadInfoEntry,
};
pub use text_writer::{write_indented, TextFrame, TextReportWriter, TextSample};
