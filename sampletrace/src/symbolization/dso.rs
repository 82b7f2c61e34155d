use serde::Deserialize;

use crate::domain::SymbolIndex;

/// Path suffix of the managed runtime's interpreter library
const INTERPRETER_SUFFIX: &str = "/libart.so";

/// Kind of a mapped module
///
/// Drives vaddr computation (kernel modules use absolute addresses) and
/// interpreter-frame collapsing (dex files hold interpreted methods).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DsoKind {
    /// Regular ELF file (executable or shared library)
    #[default]
    Elf,
    /// The kernel image
    Kernel,
    /// A loadable kernel module
    KernelModule,
    /// Dex file containing interpreted (managed) methods
    DexFile,
    /// Address isn't covered by any known mapping
    Unknown,
}

impl DsoKind {
    #[must_use]
    pub fn is_kernel(self) -> bool {
        matches!(self, DsoKind::Kernel | DsoKind::KernelModule)
    }
}

/// A symbol of a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Raw name as found in the symbol table
    pub name: String,
    /// Human-readable name; equals `name` when none was provided
    pub demangled: String,
    /// Start address relative to the file
    pub addr: u64,
    pub len: u64,
}

impl Symbol {
    pub fn new(name: impl Into<String>, demangled: Option<String>, addr: u64, len: u64) -> Self {
        let name = name.into();
        let demangled = demangled.unwrap_or_else(|| name.clone());
        Self { name, demangled, addr, len }
    }

    /// Returns true if `vaddr` falls inside this symbol
    ///
    /// Zero-length symbols only cover their start address.
    #[must_use]
    pub fn contains(&self, vaddr: u64) -> bool {
        vaddr >= self.addr && vaddr < self.addr.saturating_add(self.len.max(1))
    }
}

/// A module (executable, library, kernel image or dex file)
#[derive(Debug, Clone)]
pub struct Dso {
    path: String,
    kind: DsoKind,
    /// Sorted by address
    symbols: Vec<Symbol>,
}

impl Dso {
    pub fn new(path: impl Into<String>, kind: DsoKind, mut symbols: Vec<Symbol>) -> Self {
        symbols.sort_by_key(|symbol| symbol.addr);
        Self { path: path.into(), kind, symbols }
    }

    /// The placeholder module for addresses outside every mapping
    #[must_use]
    pub fn unknown() -> Self {
        Self::new("unknown", DsoKind::Unknown, Vec::new())
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path component, e.g. `libc.so` for `/system/lib64/libc.so`
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    #[must_use]
    pub fn kind(&self) -> DsoKind {
        self.kind
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.kind == DsoKind::Unknown
    }

    /// Returns true for the managed runtime's interpreter library
    #[must_use]
    pub fn is_interpreter(&self) -> bool {
        self.path.ends_with(INTERPRETER_SUFFIX)
    }

    /// Returns true for modules holding interpreted (managed) code
    #[must_use]
    pub fn is_interpreted_code(&self) -> bool {
        self.kind == DsoKind::DexFile
    }

    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// # Panics
    /// Panics if `index` wasn't handed out by [`Dso::find_symbol`] on this module
    #[must_use]
    pub fn symbol(&self, index: SymbolIndex) -> &Symbol {
        &self.symbols[index.index()]
    }

    /// Find the symbol covering `vaddr_in_file`
    #[must_use]
    pub fn find_symbol(&self, vaddr_in_file: u64) -> Option<SymbolIndex> {
        let pos = self.symbols.partition_point(|symbol| symbol.addr <= vaddr_in_file);
        let candidate = pos.checked_sub(1)?;
        if self.symbols[candidate].contains(vaddr_in_file) {
            u32::try_from(candidate).ok().map(SymbolIndex)
        } else {
            None
        }
    }

    /// Translate a runtime address into an address relative to this file
    ///
    /// Kernel modules are mapped at their link address, so `ip` is returned as is.
    #[must_use]
    pub fn vaddr_in_file(&self, ip: u64, map_start: u64, pgoff: u64) -> u64 {
        if self.kind.is_kernel() || self.is_unknown() {
            ip
        } else {
            ip.wrapping_sub(map_start).wrapping_add(pgoff)
        }
    }
}
