//! Sample processing pipeline
//!
//! - Call chain resolution (kernel frame removal, interpreter collapsing)
//! - Lost event accounting
//! - Event processing: raw records in, report records out

pub mod callchain;
pub mod event_processor;
pub mod lost_events;

pub use callchain::{CallChain, CallChainOptions, CallChainResolver, CallEntry};
pub use event_processor::{generate_report, EventProcessor, ReportSummary};
pub use lost_events::LostEventAccumulator;
