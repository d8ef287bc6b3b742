//! Global string interner for symbol names.
//!
//! Symbol names are interned once so that symbol equality and hashing are
//! integer operations. Ordering still goes through the resolved text, since
//! intern ids follow insertion order, not lexicographic order.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

static INTERNER: Lazy<RwLock<StringInterner<DefaultBackend>>> =
    Lazy::new(|| RwLock::new(StringInterner::default()));

/// A symbol name that has been interned in the global string interner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InternedSymbol(DefaultSymbol);

impl InternedSymbol {
    /// Intern a string and return an InternedSymbol
    pub fn new(s: &str) -> Self {
        if let Some(sym) = INTERNER.read().get(s) {
            return InternedSymbol(sym);
        }
        InternedSymbol(INTERNER.write().get_or_intern(s))
    }

    /// Resolve the interned symbol back to its string representation
    pub fn resolve(&self) -> String {
        self.with_str(str::to_string)
    }

    /// Resolve the symbol and run a function with the string slice.
    /// Avoids the allocation `resolve` makes.
    pub fn with_str<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let interner = INTERNER.read();
        // Symbols are only minted by `new`, so every id resolves.
        f(interner.resolve(self.0).unwrap_or_default())
    }

    /// Compare two interned names by their text.
    pub fn cmp_text(&self, other: &InternedSymbol) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        let interner = INTERNER.read();
        let a = interner.resolve(self.0).unwrap_or_default();
        let b = interner.resolve(other.0).unwrap_or_default();
        a.cmp(b)
    }
}

impl fmt::Display for InternedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| write!(f, "{s}"))
    }
}
