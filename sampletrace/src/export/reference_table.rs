use std::collections::HashMap;

use super::FileTableEntry;
use crate::domain::{FileId, SymbolId};
use crate::symbolization::Symbol;

/// A symbol that was given an id, with the names written to the file table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencedSymbol {
    pub name: String,
    pub demangled: String,
}

#[derive(Debug)]
struct ReferencedFile {
    path: String,
    /// Indexed by symbol id
    symbols: Vec<ReferencedSymbol>,
    symbol_ids: HashMap<(u64, String), SymbolId>,
}

/// Lazily assigned file and symbol ids for one encoding run
///
/// Ids are dense and handed out in first-reference order: the n-th distinct
/// file gets `FileId(n - 1)`, and likewise for symbols within one file.
/// Paths and names are written once, in the file table at the end of the
/// stream; samples only carry the ids.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    files: Vec<ReferencedFile>,
    file_ids: HashMap<String, FileId>,
}

impl ReferenceTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the file at `path`, assigning the next one on first use
    pub fn file_id_for(&mut self, path: &str) -> FileId {
        if let Some(&id) = self.file_ids.get(path) {
            return id;
        }
        let id = FileId(u32::try_from(self.files.len()).unwrap_or(u32::MAX));
        self.files.push(ReferencedFile {
            path: path.to_string(),
            symbols: Vec::new(),
            symbol_ids: HashMap::new(),
        });
        self.file_ids.insert(path.to_string(), id);
        id
    }

    /// Id of `symbol` within `file`, assigning the next one on first use
    ///
    /// An unknown symbol is [`SymbolId::UNRESOLVED`] and takes no id.
    ///
    /// # Panics
    /// Panics if `file` wasn't handed out by this table
    pub fn symbol_id_for(&mut self, file: FileId, symbol: Option<&Symbol>) -> SymbolId {
        let Some(symbol) = symbol else {
            return SymbolId::UNRESOLVED;
        };
        let file = &mut self.files[file.index()];
        let key = (symbol.addr, symbol.name.clone());
        if let Some(&id) = file.symbol_ids.get(&key) {
            return id;
        }
        let id = SymbolId(i32::try_from(file.symbols.len()).unwrap_or(i32::MAX));
        file.symbols.push(ReferencedSymbol {
            name: symbol.name.clone(),
            demangled: symbol.demangled.clone(),
        });
        file.symbol_ids.insert(key, id);
        id
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Referenced files as `(id, path)`, ordered by id
    pub fn files(&self) -> impl Iterator<Item = (FileId, &str)> {
        self.files
            .iter()
            .zip(0u32..)
            .map(|(file, id)| (FileId(id), file.path.as_str()))
    }

    /// Referenced symbols of `file`, indexed by symbol id
    #[must_use]
    pub fn symbols_of(&self, file: FileId) -> &[ReferencedSymbol] {
        self.files.get(file.index()).map_or(&[], |file| file.symbols.as_slice())
    }

    /// File table records, ordered by file id
    pub fn file_table(&self) -> impl Iterator<Item = FileTableEntry> + '_ {
        self.files().map(|(id, path)| {
            let symbols = self.symbols_of(id);
            FileTableEntry {
                id,
                path: path.to_string(),
                symbols: symbols.iter().map(|s| s.demangled.clone()).collect(),
                mangled_symbols: symbols.iter().map(|s| s.name.clone()).collect(),
            }
        })
    }
}
