//! Command-line interface and report configuration

pub mod args;

pub use args::{Args, DEFAULT_PROTOBUF_OUTPUT};

use crate::profiling::CallChainOptions;

/// Report format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    /// Binary stream of length-prefixed protobuf records
    Protobuf,
}

/// Options of one report run, independent of how they were given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub format: OutputFormat,
    pub show_callchain: bool,
    pub remove_unknown_kernel_symbols: bool,
    pub show_art_frames: bool,
}

impl ReportOptions {
    /// Call chain options for a record file with the given kernel symbol status
    #[must_use]
    pub fn callchain_options(&self, kernel_symbols_available: bool) -> CallChainOptions {
        CallChainOptions {
            show_callchain: self.show_callchain,
            remove_unknown_kernel_symbols: self.remove_unknown_kernel_symbols,
            show_art_frames: self.show_art_frames,
            kernel_symbols_available,
        }
    }
}
