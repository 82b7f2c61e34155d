use anyhow::{Context, Result};
use object::{Object, ObjectSymbol, SymbolKind};
use std::fs;
use std::path::Path;

use super::Symbol;

/// Read the function symbols of an ELF file
///
/// Both the static and the dynamic symbol table are used; duplicate entries
/// (same name at the same address) are collapsed. Names are kept raw.
///
/// # Errors
/// Returns an error if the file cannot be read or isn't a parseable object file
pub fn load_function_symbols(path: &Path) -> Result<Vec<Symbol>> {
    let data =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let obj = object::File::parse(&*data).context("Failed to parse object file")?;

    let mut symbols: Vec<Symbol> = obj
        .symbols()
        .chain(obj.dynamic_symbols())
        .filter(|symbol| symbol.kind() == SymbolKind::Text && symbol.address() != 0)
        .filter_map(|symbol| {
            let name = symbol.name().ok().filter(|name| !name.is_empty())?;
            Some(Symbol::new(name, None, symbol.address(), symbol.size()))
        })
        .collect();

    symbols.sort_by(|a, b| a.addr.cmp(&b.addr).then_with(|| a.name.cmp(&b.name)));
    symbols.dedup_by(|a, b| a.addr == b.addr && a.name == b.name);
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_an_error() {
        let result = load_function_symbols(Path::new("/nonexistent/libfoo.so"));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_object_file_is_an_error() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "not an elf file").unwrap();
        assert!(load_function_symbols(temp_file.path()).is_err());
    }

    #[test]
    fn test_own_test_binary_has_text_symbols() {
        // The test harness itself is an ELF file on Linux.
        let exe = std::env::current_exe().expect("Failed to get current exe");
        if let Ok(symbols) = load_function_symbols(&exe) {
            assert!(symbols.windows(2).all(|w| w[0].addr <= w[1].addr));
        }
    }
}
