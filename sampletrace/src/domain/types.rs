//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers prevent common bugs like passing a file id where a
//! symbol id is expected, or a process id where a thread id is expected.

use std::fmt;

use sampletrace_common::UNRESOLVED_SYMBOL_ID;

/// Process ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

/// Thread ID
///
/// Distinct from [`Pid`]: several threads share the pid of their process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tid(pub u32);

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TID:{}", self.0)
    }
}

/// Identity of a module inside the thread model
///
/// Only meaningful for the [`ThreadTree`](crate::symbolization::ThreadTree)
/// that handed it out. Id 0 is always the `unknown` module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DsoId(pub u32);

impl DsoId {
    pub const UNKNOWN: DsoId = DsoId(0);

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a symbol in its module's sorted symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolIndex(pub u32);

impl SymbolIndex {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// File id written to the report stream
///
/// Dense and sequential: the n-th distinct file referenced gets id `n - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Symbol id written to the report stream, scoped to one file
///
/// Negative values never index a symbol table; [`SymbolId::UNRESOLVED`] marks a
/// frame whose symbol is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub i32);

impl SymbolId {
    pub const UNRESOLVED: SymbolId = SymbolId(UNRESOLVED_SYMBOL_ID);

    /// Returns true if this id refers to an entry of the file's symbol table
    #[must_use]
    pub fn is_resolved(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_tid_display() {
        assert_eq!(Pid(1234).to_string(), "PID:1234");
        assert_eq!(Tid(77).to_string(), "TID:77");
    }

    #[test]
    fn test_symbol_id_resolution() {
        assert!(SymbolId(0).is_resolved());
        assert!(SymbolId(41).is_resolved());
        assert!(!SymbolId::UNRESOLVED.is_resolved());
        assert_eq!(SymbolId::UNRESOLVED.0, -1);
    }

    #[test]
    fn test_unknown_dso_is_first_slot() {
        assert_eq!(DsoId::UNKNOWN.index(), 0);
    }
}
