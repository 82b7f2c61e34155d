//! # Shared Wire Schema (Writer ↔ Reader)
//!
//! Defines the on-disk layout of a sample report stream. Both the encoder
//! (`sampletrace --protobuf`) and the decoder (`sampletrace --dump-protobuf-report`)
//! depend on this crate so the two sides can never drift apart.
//!
//! ## Stream Layout
//!
//! ```text
//! offset 0   : 10 bytes ASCII magic ("SIMPLEPERF")
//! offset 10  : u16 little-endian format version (1)
//! offset 12..: repeated { u32 LE length L ; L bytes protobuf `Record` }
//!              until L == 0
//! ```
//!
//! The record messages below are wire-compatible with `report_sample.proto`,
//! so streams written here can be read by any consumer of that schema.
//!
//! ## Key Types
//!
//! - [`Record`] - One framed unit; carries exactly one [`record::RecordData`]
//! - [`Sample`] - One sample with its call chain of (vaddr, file id, symbol id)
//! - [`File`] - File table entry, emitted once per referenced file
//! - [`Thread`] - Thread table entry
//! - [`MetaInfo`] - Run-level metadata, first record of the stream

// ============================================================================
// Stream Constants
// ============================================================================

/// Magic token opening every report stream (exactly 10 ASCII bytes, no NUL)
pub const MAGIC: &[u8; 10] = b"SIMPLEPERF";

/// Format version written after the magic token (little-endian `u16`)
pub const VERSION: u16 = 1;

/// Size of the stream header (magic + version)
pub const HEADER_LEN: usize = MAGIC.len() + core::mem::size_of::<u16>();

/// Size of the little-endian length prefix in front of every record
pub const LENGTH_PREFIX_LEN: usize = core::mem::size_of::<u32>();

/// Symbol id used by call chain entries whose symbol could not be resolved
///
/// Never an index into a file's symbol table.
pub const UNRESOLVED_SYMBOL_ID: i32 = -1;

// ============================================================================
// Record Messages
// ============================================================================

/// A single sample and its resolved call chain
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Sample {
    /// Sample timestamp in nanoseconds (monotonic clock of the recorder)
    #[prost(uint64, tag = "1")]
    pub time: u64,

    /// Thread the sample was taken on
    #[prost(int32, tag = "2")]
    pub thread_id: i32,

    /// Frames, innermost first
    #[prost(message, repeated, tag = "3")]
    pub callchain: ::prost::alloc::vec::Vec<sample::CallChainEntry>,

    /// Number of events this sample stands for (the sampling period)
    #[prost(uint64, tag = "4")]
    pub event_count: u64,

    /// Index into [`MetaInfo::event_type`]
    #[prost(uint32, tag = "5")]
    pub event_type_id: u32,
}

/// Nested message types of [`Sample`]
pub mod sample {
    /// One frame of a call chain
    ///
    /// Paths and symbol names are not repeated here; `file_id` indexes the
    /// [`File`](super::File) records and `symbol_id` indexes that file's
    /// `symbol` list (or is [`UNRESOLVED_SYMBOL_ID`](super::UNRESOLVED_SYMBOL_ID)).
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct CallChainEntry {
        /// Address of the frame relative to the file it belongs to
        #[prost(uint64, tag = "1")]
        pub vaddr_in_file: u64,

        #[prost(uint32, tag = "2")]
        pub file_id: u32,

        #[prost(int32, tag = "3")]
        pub symbol_id: i32,
    }
}

/// Totals of delivered and dropped samples for the whole run
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LostSituation {
    #[prost(uint64, tag = "1")]
    pub sample_count: u64,

    #[prost(uint64, tag = "2")]
    pub lost_count: u64,
}

/// File table entry
///
/// `symbol[i]` and `mangled_symbol[i]` both describe symbol id `i`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct File {
    /// Sequential file id, starting at 0
    #[prost(uint32, tag = "1")]
    pub id: u32,

    #[prost(string, tag = "2")]
    pub path: ::prost::alloc::string::String,

    /// Demangled symbol names, indexed by symbol id
    #[prost(string, repeated, tag = "3")]
    pub symbol: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,

    /// Raw symbol names, index-aligned with `symbol`
    #[prost(string, repeated, tag = "4")]
    pub mangled_symbol: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

/// Thread table entry
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Thread {
    #[prost(uint32, tag = "1")]
    pub thread_id: u32,

    #[prost(uint32, tag = "2")]
    pub process_id: u32,

    #[prost(string, tag = "3")]
    pub thread_name: ::prost::alloc::string::String,
}

/// Run-level metadata
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MetaInfo {
    /// Event type names, indexed by [`Sample::event_type_id`]
    #[prost(string, repeated, tag = "1")]
    pub event_type: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,

    /// Package name of the profiled app, when recorded for one
    #[prost(string, optional, tag = "2")]
    pub app_package_name: ::core::option::Option<::prost::alloc::string::String>,
}

/// The framing unit of a report stream
///
/// A well-formed record always has `record_data` set; a record without it
/// comes from an unknown (newer) record kind.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Record {
    #[prost(oneof = "record::RecordData", tags = "1, 2, 3, 4, 5")]
    pub record_data: ::core::option::Option<record::RecordData>,
}

/// Nested message types of [`Record`]
pub mod record {
    /// Payload of a [`Record`](super::Record)
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum RecordData {
        #[prost(message, tag = "1")]
        Sample(super::Sample),

        #[prost(message, tag = "2")]
        Lost(super::LostSituation),

        #[prost(message, tag = "3")]
        File(super::File),

        #[prost(message, tag = "4")]
        Thread(super::Thread),

        #[prost(message, tag = "5")]
        MetaInfo(super::MetaInfo),
    }
}
