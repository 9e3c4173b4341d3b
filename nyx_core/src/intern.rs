//! String interning with stable integer ids.
//!
//! The interner stores unique copies of identifiers and string literals and
//! hands out lightweight [`Symbol`] handles. Interning the same string twice
//! returns the same symbol, so AST nodes, label maps, and definition tables
//! can key on a `Copy` integer instead of owned strings.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A handle to an interned string.
///
/// Symbols are stable for the lifetime of the interner that produced them.
/// Two symbols from the same interner are equal if and only if they refer to
/// the same string content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Get the raw index of this symbol.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Thread-safe string interner.
///
/// Shared via `Arc` between the lexer, parser, preprocessor, and assembler
/// so that symbols created in any phase resolve in every other.
pub struct Interner {
    inner: RwLock<InternerInner>,
}

struct InternerInner {
    map: FxHashMap<Arc<str>, Symbol>,
    strings: Vec<Arc<str>>,
}

impl Interner {
    /// Create a new, empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(InternerInner {
                map: FxHashMap::default(),
                strings: Vec::new(),
            }),
        }
    }

    /// Intern a string, returning its symbol.
    ///
    /// Returns the existing symbol if the string was interned before.
    pub fn intern(&self, s: &str) -> Symbol {
        {
            let inner = self.inner.read();
            if let Some(&sym) = inner.map.get(s) {
                return sym;
            }
        }

        let mut inner = self.inner.write();
        // Another caller may have interned between the read and write lock.
        if let Some(&sym) = inner.map.get(s) {
            return sym;
        }

        let arc: Arc<str> = Arc::from(s);
        let sym = Symbol(inner.strings.len() as u32);
        inner.strings.push(arc.clone());
        inner.map.insert(arc, sym);
        sym
    }

    /// Resolve a symbol back to its string content.
    ///
    /// # Panics
    /// Panics if the symbol did not originate from this interner.
    #[must_use]
    pub fn resolve(&self, sym: Symbol) -> Arc<str> {
        self.inner.read().strings[sym.0 as usize].clone()
    }

    /// Number of distinct strings interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Check if the interner is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner")
            .field("len", &self.len())
            .finish()
    }
}
