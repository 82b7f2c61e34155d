//! # Address Resolution
//!
//! Turns the raw instruction pointers of a sample into frames: the module
//! (DSO) an address belongs to, the address relative to that module's file,
//! and, when the module's symbol table covers it, the symbol.
//!
//! ## Model
//!
//! ```text
//! comm / mmap records ──► ThreadTree ──► AddressResolver::lookup(pid, ip, in_kernel)
//!                            │                     │
//!                            ├─ threads (by tid)   └─► AddressLookup { dso, symbol, vaddr_in_file }
//!                            ├─ user maps (by pid)
//!                            ├─ kernel maps (global)
//!                            └─ DSO table (id 0 = "unknown")
//! ```
//!
//! ## vaddr_in_file
//!
//! User-space modules are position independent, so the runtime address is
//! translated back into the file: `ip - map.start + map.pgoff`. Kernel images
//! and kernel modules are mapped at their link address; `ip` is used as is.
//!
//! ## Symbols
//!
//! Modules declared in the record file header carry their symbol table
//! (with demangled names, which are never computed here). Other ELF modules
//! get their function symbols from the file on disk via the `object` crate.

pub mod dso;
pub mod elf_symbols;
pub mod thread_tree;

pub use dso::{Dso, DsoKind, Symbol};
pub use thread_tree::{ThreadEntry, ThreadTree};

use crate::domain::{DsoId, Pid, SymbolIndex};

/// Result of resolving one instruction pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressLookup {
    /// Module containing the address ([`DsoId::UNKNOWN`] if unmapped)
    pub dso: DsoId,
    /// Covering symbol in the module's table, if any
    pub symbol: Option<SymbolIndex>,
    pub vaddr_in_file: u64,
}

/// Resolves instruction pointers to modules and symbols
///
/// Implemented by [`ThreadTree`]; tests substitute a fixed table.
pub trait AddressResolver {
    /// Resolve `ip` in the address space of `process` (or the kernel's)
    fn lookup(&self, process: Pid, ip: u64, in_kernel: bool) -> AddressLookup;

    /// The module behind an id returned by [`AddressResolver::lookup`]
    fn dso(&self, id: DsoId) -> &Dso;
}
