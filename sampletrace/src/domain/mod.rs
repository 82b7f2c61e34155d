//! Domain model for sampletrace
//!
//! Newtype ids keep the id spaces apart: thread and process ids of the
//! recorded system, module and symbol indices of the in-memory model, and the
//! file and symbol ids written to a report stream. Errors are grouped by the
//! stage that raises them.

pub mod errors;
pub mod types;

pub use types::{DsoId, FileId, Pid, SymbolId, SymbolIndex, Tid};

pub use errors::{FormatError, IntegrityError, ReportError, StreamError};
