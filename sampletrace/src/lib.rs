//! # sampletrace - Sample Report Generator
//!
//! sampletrace turns the raw records of a profiling session (thread names,
//! memory mappings, samples with raw call chains, lost-sample notices) into a
//! report of resolved samples, either as indented text or as a compact binary
//! stream of length-prefixed protobuf records. A binary report can be dumped
//! back to text and checked for consistent ids.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Record File (JSON lines)                       │
//! │   header: meta info, event types, declared modules + symbols    │
//! │   records: comm, mmap, sample, lost                             │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ RecordFileReader
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      EventProcessor                             │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │  ThreadTree  │──▶│  CallChain   │──▶│    Lost      │         │
//! │  │ (maps, dsos) │   │  Resolver    │   │ Accumulator  │         │
//! │  └──────────────┘   └──────┬───────┘   └──────────────┘         │
//! │                            │                                    │
//! │             ┌──────────────┴──────────────┐                     │
//! │             ▼                             ▼                     │
//! │  ┌──────────────────────┐      ┌──────────────────────┐         │
//! │  │ ReferenceTable +     │      │  TextReportWriter    │         │
//! │  │ BinaryStreamEncoder  │      │                      │         │
//! │  └──────────┬───────────┘      └──────────────────────┘         │
//! └─────────────┼───────────────────────────────────────────────────┘
//!               ▼
//!      report_sample.trace ──▶ dump (decoder + validator) ──▶ text
//! ```
//!
//! ## Module Structure
//!
//! - [`record`]: Raw record types and the JSON-lines reader
//! - [`symbolization`]: Modules, symbols and the per-process address model
//! - [`profiling`]: Call chain resolution, lost accounting, event processing
//! - [`export`]: Stream records, id assignment, binary and text writers
//! - [`dump`]: Binary stream decoding, rendering and id validation
//! - [`cli`]: Command-line arguments and report options
//! - [`domain`]: Newtype ids and error types
//!
//! ## Binary Stream
//!
//! ```text
//! "SIMPLEPERF" u16(1) | meta_info | sample* | lost_situation | file* | thread* | u32(0)
//! ```
//!
//! Files and symbols are referenced by ids assigned on first use; their
//! names are written once, in the file records at the end.

pub mod cli;
pub mod domain;
pub mod dump;
pub mod export;
pub mod profiling;
pub mod record;
pub mod symbolization;
