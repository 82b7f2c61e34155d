use std::collections::BTreeMap;

use crate::domain::{FileId, IntegrityError};
use crate::export::StreamRecord;

/// Checks the cross-record references of a stream
///
/// Samples come before the file records they refer to, so bounds are only
/// checked by [`ReferenceValidator::finish`] once the whole stream was seen.
/// File order and the symbol id floor are checked as records arrive.
#[derive(Debug, Default)]
pub struct ReferenceValidator {
    /// `symbol_counts[file_id]` is the number of symbols of that file
    symbol_counts: Vec<u32>,
    /// Largest resolved symbol id referenced per file id
    max_symbol_ids: BTreeMap<u32, i32>,
}

impl ReferenceValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns an error for a symbol id below -1 or an out-of-order file id
    pub fn observe(&mut self, record: &StreamRecord) -> Result<(), IntegrityError> {
        match record {
            StreamRecord::Sample(sample) => {
                for entry in &sample.callchain {
                    let symbol_id = entry.symbol_id;
                    if symbol_id.0 < -1 {
                        return Err(IntegrityError::InvalidSymbolId {
                            file_id: entry.file_id.0,
                            symbol_id: symbol_id.0,
                        });
                    }
                    if symbol_id.is_resolved() {
                        let max = self.max_symbol_ids.entry(entry.file_id.0).or_insert(symbol_id.0);
                        *max = (*max).max(symbol_id.0);
                    }
                }
            }
            StreamRecord::File(file) => {
                let expected = u32::try_from(self.symbol_counts.len()).unwrap_or(u32::MAX);
                if file.id.0 != expected {
                    return Err(IntegrityError::FileIdOutOfOrder { expected, actual: file.id.0 });
                }
                self.symbol_counts.push(u32::try_from(file.symbols.len()).unwrap_or(u32::MAX));
            }
            StreamRecord::Lost(_) | StreamRecord::Thread(_) | StreamRecord::MetaInfo(_) => {}
        }
        Ok(())
    }

    /// Check every referenced file and symbol id against the file records
    ///
    /// # Errors
    /// Returns the first reference outside its table
    pub fn finish(&self) -> Result<(), IntegrityError> {
        for (&file_id, &max_symbol_id) in &self.max_symbol_ids {
            let Some(&symbol_count) = self.symbol_counts.get(FileId(file_id).index()) else {
                return Err(IntegrityError::FileIdOutOfRange {
                    file_id,
                    file_count: self.symbol_counts.len(),
                });
            };
            if i64::from(max_symbol_id) >= i64::from(symbol_count) {
                return Err(IntegrityError::SymbolIdOutOfRange {
                    file_id,
                    symbol_id: max_symbol_id,
                    symbol_count,
                });
            }
        }
        Ok(())
    }

    /// Symbol count of every file record seen, indexed by file id
    #[must_use]
    pub fn symbol_counts(&self) -> &[u32] {
        &self.symbol_counts
    }
}
