//! Raw records produced by the recorder
//!
//! A record file is JSON lines: the first line is a [`RecordFileHeader`], every
//! following JSON value is one [`RawRecord`]. Records are pulled one at a time
//! by [`RecordFileReader`] and dispatched by the
//! [`EventProcessor`](crate::profiling::EventProcessor).
//!
//! ```text
//! {"meta_info":{"kernel_symbols_available":"false"},"event_types":["cpu-cycles"],"dsos":[...]}
//! {"type":"comm","pid":10,"tid":10,"comm":"main"}
//! {"type":"mmap","pid":10,"start":4096,"len":8192,"pgoff":0,"path":"/system/lib64/libc.so"}
//! {"type":"sample","pid":10,"tid":10,"time":1000,"period":1,"ip":4200}
//! {"type":"lost","lost":3}
//! ```

pub mod reader;

pub use reader::{RecordFileReader, Records};

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::domain::{Pid, Tid};
use crate::symbolization::DsoKind;

/// First line of a record file: run-level metadata and module declarations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFileHeader {
    /// Free-form key/value metadata written by the recorder
    #[serde(default)]
    pub meta_info: BTreeMap<String, String>,

    /// Event type names, indexed by [`SampleRecord::event_type_index`]
    #[serde(default)]
    pub event_types: Vec<String>,

    /// Modules whose kind or symbol table is known up front
    #[serde(default)]
    pub dsos: Vec<DsoDeclaration>,
}

impl RecordFileHeader {
    fn meta_flag(&self, key: &str) -> bool {
        self.meta_info.get(key).is_some_and(|value| value == "true")
    }

    /// Whether the recorder also traced off-CPU time
    #[must_use]
    pub fn trace_offcpu(&self) -> bool {
        self.meta_flag("trace_offcpu")
    }

    /// Whether kernel symbols could be read when recording
    #[must_use]
    pub fn kernel_symbols_available(&self) -> bool {
        self.meta_flag("kernel_symbols_available")
    }

    /// Package name of the profiled app (empty values count as absent)
    #[must_use]
    pub fn app_package_name(&self) -> Option<&str> {
        self.meta_info
            .get("app_package_name")
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }
}

/// A module declared in the header
#[derive(Debug, Clone, Deserialize)]
pub struct DsoDeclaration {
    pub path: String,

    #[serde(default)]
    pub kind: DsoKind,

    /// Symbol table; `None` means "read it from the file on disk"
    #[serde(default)]
    pub symbols: Option<Vec<SymbolDeclaration>>,
}

/// One symbol of a declared module
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolDeclaration {
    /// Raw (possibly mangled) name
    pub name: String,

    /// Human-readable name, defaults to `name`
    #[serde(default)]
    pub demangled: Option<String>,

    /// Start address relative to the file
    pub addr: u64,

    #[serde(default)]
    pub len: u64,
}

/// One raw event, in recording order
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawRecord {
    Comm(CommRecord),
    Mmap(MmapRecord),
    Sample(SampleRecord),
    Lost(LostRecord),
}

/// A thread was (re)named
#[derive(Debug, Clone, Deserialize)]
pub struct CommRecord {
    pub pid: u32,
    pub tid: u32,
    pub comm: String,
}

/// A module was mapped into a process (or into the kernel)
#[derive(Debug, Clone, Deserialize)]
pub struct MmapRecord {
    #[serde(default)]
    pub pid: u32,
    pub start: u64,
    pub len: u64,
    #[serde(default)]
    pub pgoff: u64,
    pub path: String,
    #[serde(default)]
    pub in_kernel: bool,
}

/// A sample with its raw call chain
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRecord {
    #[serde(default)]
    pub event_type_index: usize,

    #[serde(default)]
    pub time: u64,

    #[serde(default = "default_period")]
    pub period: u64,

    pub pid: u32,
    pub tid: u32,

    /// Sampled instruction pointer, used when `callchain` is empty
    pub ip: u64,

    /// Whether `ip` was in kernel context
    #[serde(default)]
    pub in_kernel: bool,

    /// Full call chain, innermost first (includes the sampled ip)
    #[serde(default)]
    pub callchain: Vec<u64>,

    /// Number of leading `callchain` entries in kernel context
    #[serde(default)]
    pub kernel_ip_count: usize,
}

fn default_period() -> u64 {
    1
}

impl SampleRecord {
    #[must_use]
    pub fn pid(&self) -> Pid {
        Pid(self.pid)
    }

    #[must_use]
    pub fn tid(&self) -> Tid {
        Tid(self.tid)
    }

    /// Instruction pointers of this sample and how many leading ones are kernel addresses
    #[must_use]
    pub fn call_chain(&self) -> (Vec<u64>, usize) {
        if self.callchain.is_empty() {
            (vec![self.ip], usize::from(self.in_kernel))
        } else {
            let kernel_ip_count = self.kernel_ip_count.min(self.callchain.len());
            (self.callchain.clone(), kernel_ip_count)
        }
    }
}

/// The recorder dropped samples
#[derive(Debug, Clone, Deserialize)]
pub struct LostRecord {
    pub lost: u64,
}
