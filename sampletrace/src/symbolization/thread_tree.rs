use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::{elf_symbols, AddressLookup, AddressResolver, Dso, DsoKind, Symbol};
use crate::domain::{DsoId, Pid, Tid};
use crate::record::{CommRecord, DsoDeclaration, MmapRecord, RawRecord};

const UNKNOWN_THREAD_NAME: &str = "unknown";

/// A thread seen in the record file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadEntry {
    pub pid: Pid,
    pub tid: Tid,
    pub comm: String,
}

#[derive(Debug, Clone, Copy)]
struct MapEntry {
    start: u64,
    len: u64,
    pgoff: u64,
    dso: DsoId,
}

impl MapEntry {
    fn end(&self) -> u64 {
        self.start.saturating_add(self.len)
    }

    fn contains(&self, ip: u64) -> bool {
        ip >= self.start && ip < self.end()
    }

    fn overlaps(&self, other: &MapEntry) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Sorted, non-overlapping mappings of one address space
#[derive(Debug, Default)]
struct AddressSpace {
    maps: Vec<MapEntry>,
}

impl AddressSpace {
    /// Insert a mapping; older mappings overlapping it are dropped
    fn insert(&mut self, map: MapEntry) {
        self.maps.retain(|existing| !existing.overlaps(&map));
        let pos = self.maps.partition_point(|existing| existing.start < map.start);
        self.maps.insert(pos, map);
    }

    fn find(&self, ip: u64) -> Option<&MapEntry> {
        let pos = self.maps.partition_point(|map| map.start <= ip);
        pos.checked_sub(1).map(|i| &self.maps[i]).filter(|map| map.contains(ip))
    }
}

/// Process, thread and module model built from comm/mmap records
///
/// Resolves instruction pointers to modules and symbols for the
/// [`CallChainResolver`](crate::profiling::CallChainResolver).
#[derive(Debug)]
pub struct ThreadTree {
    threads: BTreeMap<Tid, ThreadEntry>,
    user_spaces: HashMap<Pid, AddressSpace>,
    kernel_space: AddressSpace,
    dsos: Vec<Dso>,
    dso_ids: HashMap<String, DsoId>,
    /// Read symbol tables of undeclared modules from disk
    load_symbols_from_disk: bool,
}

impl Default for ThreadTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadTree {
    #[must_use]
    pub fn new() -> Self {
        Self {
            threads: BTreeMap::new(),
            user_spaces: HashMap::new(),
            kernel_space: AddressSpace::default(),
            dsos: vec![Dso::unknown()],
            dso_ids: HashMap::new(),
            load_symbols_from_disk: true,
        }
    }

    /// Create a tree that knows the modules declared in a record file header
    #[must_use]
    pub fn with_declarations(declarations: &[DsoDeclaration]) -> Self {
        let mut tree = Self::new();
        for declaration in declarations {
            let symbols = declaration.symbols.as_ref().map(|symbols| {
                symbols
                    .iter()
                    .map(|s| Symbol::new(s.name.clone(), s.demangled.clone(), s.addr, s.len))
                    .collect()
            });
            tree.declare_dso(&declaration.path, declaration.kind, symbols);
        }
        tree
    }

    /// Don't touch the filesystem for modules without a declared symbol table
    pub fn disable_disk_symbols(&mut self) {
        self.load_symbols_from_disk = false;
    }

    /// Register a module, or update the kind and symbols of a known one
    ///
    /// `symbols: None` reads the symbol table from `path` if it is an ELF file
    /// on disk, and leaves the module without symbols otherwise.
    pub fn declare_dso(&mut self, path: &str, kind: DsoKind, symbols: Option<Vec<Symbol>>) -> DsoId {
        let symbols = symbols.unwrap_or_else(|| self.symbols_from_disk(path, kind));
        if let Some(&id) = self.dso_ids.get(path) {
            self.dsos[id.index()] = Dso::new(path, kind, symbols);
            return id;
        }
        let id = DsoId(u32::try_from(self.dsos.len()).unwrap_or(u32::MAX));
        self.dsos.push(Dso::new(path, kind, symbols));
        self.dso_ids.insert(path.to_string(), id);
        id
    }

    fn symbols_from_disk(&self, path: &str, kind: DsoKind) -> Vec<Symbol> {
        if !self.load_symbols_from_disk || kind != DsoKind::Elf || !Path::new(path).is_file() {
            return Vec::new();
        }
        match elf_symbols::load_function_symbols(Path::new(path)) {
            Ok(symbols) => {
                debug!("Loaded {} symbols from {path}", symbols.len());
                symbols
            }
            Err(e) => {
                warn!("No symbols for {path}: {e:#}");
                Vec::new()
            }
        }
    }

    fn dso_for_mmap(&mut self, mmap: &MmapRecord) -> DsoId {
        if let Some(&id) = self.dso_ids.get(&mmap.path) {
            return id;
        }
        let kind = if !mmap.in_kernel {
            DsoKind::Elf
        } else if mmap.path.starts_with("[kernel") {
            DsoKind::Kernel
        } else {
            DsoKind::KernelModule
        };
        self.declare_dso(&mmap.path, kind, None)
    }

    /// Apply a comm or mmap record; other records don't change the model
    pub fn update(&mut self, record: &RawRecord) {
        match record {
            RawRecord::Comm(comm) => self.set_thread_name(comm),
            RawRecord::Mmap(mmap) => self.add_map(mmap),
            RawRecord::Sample(_) | RawRecord::Lost(_) => {}
        }
    }

    fn set_thread_name(&mut self, comm: &CommRecord) {
        let (pid, tid) = (Pid(comm.pid), Tid(comm.tid));
        let thread = self.threads.entry(tid).or_insert_with(|| ThreadEntry {
            pid,
            tid,
            comm: String::new(),
        });
        thread.pid = pid;
        thread.comm.clone_from(&comm.comm);
    }

    fn add_map(&mut self, mmap: &MmapRecord) {
        let dso = self.dso_for_mmap(mmap);
        let map = MapEntry { start: mmap.start, len: mmap.len, pgoff: mmap.pgoff, dso };
        if mmap.in_kernel {
            self.kernel_space.insert(map);
        } else {
            self.user_spaces.entry(Pid(mmap.pid)).or_default().insert(map);
        }
    }

    /// Look up a thread, creating it if no comm record named it
    ///
    /// New threads inherit the name of their process's main thread.
    pub fn find_thread_or_new(&mut self, pid: Pid, tid: Tid) -> &ThreadEntry {
        if !self.threads.contains_key(&tid) {
            let comm = self
                .threads
                .get(&Tid(pid.0))
                .map_or_else(|| UNKNOWN_THREAD_NAME.to_string(), |main| main.comm.clone());
            self.threads.insert(tid, ThreadEntry { pid, tid, comm });
        }
        &self.threads[&tid]
    }

    #[must_use]
    pub fn thread(&self, tid: Tid) -> Option<&ThreadEntry> {
        self.threads.get(&tid)
    }

    /// All known threads, ordered by thread id
    pub fn threads(&self) -> impl Iterator<Item = &ThreadEntry> {
        self.threads.values()
    }
}

impl AddressResolver for ThreadTree {
    fn lookup(&self, process: Pid, ip: u64, in_kernel: bool) -> AddressLookup {
        let map = if in_kernel {
            self.kernel_space.find(ip)
        } else {
            self.user_spaces.get(&process).and_then(|space| space.find(ip))
        };
        let Some(map) = map else {
            return AddressLookup { dso: DsoId::UNKNOWN, symbol: None, vaddr_in_file: ip };
        };
        let dso = &self.dsos[map.dso.index()];
        let vaddr_in_file = dso.vaddr_in_file(ip, map.start, map.pgoff);
        AddressLookup { dso: map.dso, symbol: dso.find_symbol(vaddr_in_file), vaddr_in_file }
    }

    fn dso(&self, id: DsoId) -> &Dso {
        &self.dsos[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mmap(pid: u32, start: u64, len: u64, path: &str) -> RawRecord {
        RawRecord::Mmap(MmapRecord {
            pid,
            start,
            len,
            pgoff: 0,
            path: path.to_string(),
            in_kernel: false,
        })
    }

    fn tree_with_libc() -> ThreadTree {
        let mut tree = ThreadTree::new();
        tree.disable_disk_symbols();
        tree.declare_dso(
            "/system/lib64/libc.so",
            DsoKind::Elf,
            Some(vec![Symbol::new("read", None, 0x100, 0x20)]),
        );
        tree.update(&mmap(10, 0x1000, 0x1000, "/system/lib64/libc.so"));
        tree
    }

    #[test]
    fn test_lookup_resolves_symbol_in_mapped_dso() {
        let tree = tree_with_libc();
        let lookup = tree.lookup(Pid(10), 0x1110, false);
        let dso = tree.dso(lookup.dso);
        assert_eq!(dso.path(), "/system/lib64/libc.so");
        assert_eq!(lookup.vaddr_in_file, 0x110);
        assert_eq!(lookup.symbol.map(|s| dso.symbol(s).name.as_str()), Some("read"));
    }

    #[test]
    fn test_lookup_outside_maps_is_unknown() {
        let tree = tree_with_libc();
        let lookup = tree.lookup(Pid(10), 0x9000, false);
        assert_eq!(lookup.dso, DsoId::UNKNOWN);
        assert!(tree.dso(lookup.dso).is_unknown());
        assert_eq!(lookup.symbol, None);

        // Other processes don't share the mapping
        assert_eq!(tree.lookup(Pid(11), 0x1110, false).dso, DsoId::UNKNOWN);
    }

    #[test]
    fn test_kernel_maps_are_global() {
        let mut tree = ThreadTree::new();
        tree.disable_disk_symbols();
        tree.update(&RawRecord::Mmap(MmapRecord {
            pid: 0,
            start: 0xffff_0000,
            len: 0x1000,
            pgoff: 0,
            path: "[kernel.kallsyms]".to_string(),
            in_kernel: true,
        }));
        let lookup = tree.lookup(Pid(42), 0xffff_0010, true);
        assert_eq!(tree.dso(lookup.dso).kind(), DsoKind::Kernel);
        assert_eq!(lookup.vaddr_in_file, 0xffff_0010);
        // Kernel maps are not visible to user-context lookups
        assert_eq!(tree.lookup(Pid(42), 0xffff_0010, false).dso, DsoId::UNKNOWN);
    }

    #[test]
    fn test_newer_mapping_replaces_overlapping_one() {
        let mut tree = tree_with_libc();
        tree.update(&mmap(10, 0x1800, 0x1000, "/data/app/libfoo.so"));
        assert!(tree.dso(tree.lookup(Pid(10), 0x1100, false).dso).is_unknown());
        assert_eq!(tree.dso(tree.lookup(Pid(10), 0x1900, false).dso).path(), "/data/app/libfoo.so");
    }

    #[test]
    fn test_threads_inherit_process_name() {
        let mut tree = ThreadTree::new();
        tree.update(&RawRecord::Comm(CommRecord { pid: 5, tid: 5, comm: "app".to_string() }));
        assert_eq!(tree.find_thread_or_new(Pid(5), Tid(6)).comm, "app");
        assert_eq!(tree.find_thread_or_new(Pid(9), Tid(9)).comm, "unknown");

        let tids: Vec<u32> = tree.threads().map(|t| t.tid.0).collect();
        assert_eq!(tids, vec![5, 6, 9]);
    }

    #[test]
    fn test_declared_dso_keeps_id_when_redeclared() {
        let mut tree = ThreadTree::new();
        tree.disable_disk_symbols();
        let first = tree.declare_dso("/a.so", DsoKind::Elf, Some(Vec::new()));
        let second = tree.declare_dso("/a.so", DsoKind::DexFile, Some(Vec::new()));
        assert_eq!(first, second);
        assert!(tree.dso(first).is_interpreted_code());
    }
}
