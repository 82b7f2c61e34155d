//! Call chain resolution
//!
//! Turns the raw instruction pointers of one sample into resolved frames:
//!
//! 1. Kernel frames are dropped when they can't be symbolized and the user
//!    asked for it (`--remove-unknown-kernel-symbols`).
//! 2. Without `--show-callchain` only the sampled frame is kept.
//! 3. Each pointer is resolved; the first frame is kept even in an unknown
//!    module, a later frame in an unknown module ends the chain.
//! 4. Unless `--show-art-frames`, interpreter frames around interpreted
//!    methods are collapsed so the managed method stands in for them.

use crate::domain::{DsoId, Pid, SymbolIndex};
use crate::symbolization::AddressResolver;

/// Options controlling call chain resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallChainOptions {
    /// Keep the full chain instead of the sampled frame only
    pub show_callchain: bool,
    /// Drop kernel frames when kernel symbols weren't available at record time
    pub remove_unknown_kernel_symbols: bool,
    /// Keep interpreter frames next to interpreted methods
    pub show_art_frames: bool,
    /// Taken from the record file's meta info
    pub kernel_symbols_available: bool,
}

/// One resolved frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEntry {
    pub dso: DsoId,
    /// `None` when no symbol covers the address
    pub symbol: Option<SymbolIndex>,
    pub vaddr_in_file: u64,
}

/// The resolved frames of one sample, innermost first
///
/// `entries` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallChain {
    pub entries: Vec<CallEntry>,
    /// Number of leading pointers that were resolved in kernel context
    pub kernel_frames: usize,
}

impl CallChain {
    /// The sampled frame
    #[must_use]
    pub fn top(&self) -> &CallEntry {
        &self.entries[0]
    }
}

/// Resolves raw call chains against an [`AddressResolver`]
#[derive(Debug, Clone)]
pub struct CallChainResolver {
    options: CallChainOptions,
}

impl CallChainResolver {
    #[must_use]
    pub fn new(options: CallChainOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &CallChainOptions {
        &self.options
    }

    /// Resolve the pointers of one sample taken in `process`
    ///
    /// `kernel_ip_count` leading pointers are looked up in kernel context.
    /// Returns `None` when nothing is left to report, in which case the
    /// sample is skipped entirely.
    pub fn resolve<A: AddressResolver + ?Sized>(
        &self,
        resolver: &A,
        process: Pid,
        mut ips: Vec<u64>,
        mut kernel_ip_count: usize,
    ) -> Option<CallChain> {
        kernel_ip_count = kernel_ip_count.min(ips.len());
        if kernel_ip_count > 0
            && self.options.remove_unknown_kernel_symbols
            && !self.options.kernel_symbols_available
        {
            ips.drain(..kernel_ip_count);
            kernel_ip_count = 0;
        }
        if ips.is_empty() {
            return None;
        }
        if !self.options.show_callchain {
            ips.truncate(1);
            kernel_ip_count = kernel_ip_count.min(1);
        }

        let mut entries: Vec<CallEntry> = Vec::with_capacity(ips.len());
        let mut near_interpreted_code = false;
        for (i, &ip) in ips.iter().enumerate() {
            let lookup = resolver.lookup(process, ip, i < kernel_ip_count);
            let dso = resolver.dso(lookup.dso);
            if i > 0 && dso.is_unknown() {
                break;
            }

            if !self.options.show_art_frames {
                if dso.is_interpreted_code() {
                    near_interpreted_code = true;
                    while entries
                        .last()
                        .is_some_and(|entry| resolver.dso(entry.dso).is_interpreter())
                    {
                        entries.pop();
                    }
                } else if dso.is_interpreter() {
                    if near_interpreted_code {
                        continue;
                    }
                } else {
                    near_interpreted_code = false;
                }
            }

            entries.push(CallEntry {
                dso: lookup.dso,
                symbol: lookup.symbol,
                vaddr_in_file: lookup.vaddr_in_file,
            });
        }

        Some(CallChain { entries, kernel_frames: kernel_ip_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolization::{AddressLookup, Dso, DsoKind};
    use std::collections::HashMap;

    const KERNEL: DsoId = DsoId(1);
    const APP: DsoId = DsoId(2);
    const INTERP: DsoId = DsoId(3);
    const DEX: DsoId = DsoId(4);

    /// Resolves each address to the module registered for it
    struct FixedResolver {
        dsos: Vec<Dso>,
        addrs: HashMap<u64, DsoId>,
    }

    impl FixedResolver {
        fn new(addrs: &[(u64, DsoId)]) -> Self {
            Self {
                dsos: vec![
                    Dso::unknown(),
                    Dso::new("[kernel.kallsyms]", DsoKind::Kernel, Vec::new()),
                    Dso::new("/data/app/libapp.so", DsoKind::Elf, Vec::new()),
                    Dso::new("/apex/com.android.art/lib64/libart.so", DsoKind::Elf, Vec::new()),
                    Dso::new("/data/app/base.apk!/classes.dex", DsoKind::DexFile, Vec::new()),
                ],
                addrs: addrs.iter().copied().collect(),
            }
        }
    }

    impl AddressResolver for FixedResolver {
        fn lookup(&self, _process: Pid, ip: u64, _in_kernel: bool) -> AddressLookup {
            let dso = self.addrs.get(&ip).copied().unwrap_or(DsoId::UNKNOWN);
            AddressLookup { dso, symbol: None, vaddr_in_file: ip }
        }

        fn dso(&self, id: DsoId) -> &Dso {
            &self.dsos[id.index()]
        }
    }

    fn full_chain() -> CallChainOptions {
        CallChainOptions { show_callchain: true, ..CallChainOptions::default() }
    }

    fn dsos_of(chain: &CallChain) -> Vec<DsoId> {
        chain.entries.iter().map(|entry| entry.dso).collect()
    }

    #[test]
    fn test_unknown_kernel_frames_are_removed() {
        let resolver =
            FixedResolver::new(&[(1, KERNEL), (2, KERNEL), (3, APP), (4, APP), (5, APP)]);
        let options = CallChainOptions { remove_unknown_kernel_symbols: true, ..full_chain() };

        let chain = CallChainResolver::new(options)
            .resolve(&resolver, Pid(1), vec![1, 2, 3, 4, 5], 2)
            .unwrap();
        assert_eq!(chain.entries.len(), 3);
        assert_eq!(chain.kernel_frames, 0);
        assert!(chain.entries.iter().all(|entry| entry.dso == APP));
    }

    #[test]
    fn test_kernel_frames_kept_when_symbols_available() {
        let resolver = FixedResolver::new(&[(1, KERNEL), (2, KERNEL), (3, APP)]);
        let options = CallChainOptions {
            remove_unknown_kernel_symbols: true,
            kernel_symbols_available: true,
            ..full_chain()
        };

        let chain = CallChainResolver::new(options).resolve(&resolver, Pid(1), vec![1, 2, 3], 2).unwrap();
        assert_eq!(dsos_of(&chain), vec![KERNEL, KERNEL, APP]);
        assert_eq!(chain.kernel_frames, 2);
    }

    #[test]
    fn test_only_kernel_frames_leaves_nothing() {
        let resolver = FixedResolver::new(&[(1, KERNEL)]);
        let options = CallChainOptions { remove_unknown_kernel_symbols: true, ..full_chain() };
        assert_eq!(CallChainResolver::new(options).resolve(&resolver, Pid(1), vec![1], 1), None);
        assert_eq!(CallChainResolver::new(options).resolve(&resolver, Pid(1), Vec::new(), 0), None);
    }

    #[test]
    fn test_interpreter_frames_collapse_around_managed_code() {
        let resolver = FixedResolver::new(&[
            (1, INTERP),
            (2, INTERP),
            (3, DEX),
            (4, INTERP),
            (5, INTERP),
            (6, APP),
        ]);
        let ips = vec![1, 2, 3, 4, 5, 6];

        let chain = CallChainResolver::new(full_chain()).resolve(&resolver, Pid(1), ips.clone(), 0).unwrap();
        assert_eq!(dsos_of(&chain), vec![DEX, APP]);

        let options = CallChainOptions { show_art_frames: true, ..full_chain() };
        let chain = CallChainResolver::new(options).resolve(&resolver, Pid(1), ips, 0).unwrap();
        assert_eq!(dsos_of(&chain), vec![INTERP, INTERP, DEX, INTERP, INTERP, APP]);
    }

    #[test]
    fn test_interpreter_frames_away_from_managed_code_are_kept() {
        let resolver = FixedResolver::new(&[(1, APP), (2, INTERP), (3, APP), (4, INTERP)]);
        let chain = CallChainResolver::new(full_chain())
            .resolve(&resolver, Pid(1), vec![1, 2, 3, 4], 0)
            .unwrap();
        assert_eq!(dsos_of(&chain), vec![APP, INTERP, APP, INTERP]);
    }

    #[test]
    fn test_chain_ends_at_first_unknown_module() {
        let resolver = FixedResolver::new(&[(1, APP), (3, APP)]);
        let chain = CallChainResolver::new(full_chain()).resolve(&resolver, Pid(1), vec![1, 2, 3], 0).unwrap();
        assert_eq!(dsos_of(&chain), vec![APP]);
    }

    #[test]
    fn test_unknown_top_frame_is_kept() {
        let resolver = FixedResolver::new(&[(2, APP)]);
        let chain = CallChainResolver::new(full_chain()).resolve(&resolver, Pid(1), vec![9, 2], 0).unwrap();
        assert_eq!(dsos_of(&chain), vec![DsoId::UNKNOWN, APP]);
        assert_eq!(chain.top().vaddr_in_file, 9);
    }

    #[test]
    fn test_without_callchain_only_top_frame_is_kept() {
        let resolver = FixedResolver::new(&[(1, KERNEL), (2, KERNEL), (3, APP)]);
        let chain = CallChainResolver::new(CallChainOptions::default())
            .resolve(&resolver, Pid(1), vec![1, 2, 3], 2)
            .unwrap();
        assert_eq!(dsos_of(&chain), vec![KERNEL]);
        assert_eq!(chain.kernel_frames, 1);
    }
}
