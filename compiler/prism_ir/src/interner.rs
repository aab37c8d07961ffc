//! String interner backing [`Name`].
//!
//! Provides O(1) interning and lookup. Interned strings are leaked into
//! `'static` storage; a compilation interns a bounded set of identifiers,
//! so the leak is the table itself.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;

use crate::Name;

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// The intern table exceeded `u32::MAX` entries.
    Overflow {
        /// Number of strings already interned.
        count: usize,
    },
}

impl fmt::Display for InternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InternError::Overflow { count } => write!(
                f,
                "interner exceeded capacity: {} strings, max is {}",
                count,
                u32::MAX
            ),
        }
    }
}

impl std::error::Error for InternError {}

struct Inner {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents, indexed by `Name`.
    strings: Vec<&'static str>,
}

/// String interner providing O(1) lookup and equality for identifiers.
///
/// Uses an `RwLock` so a single interner can be shared by reference
/// across every phase of a compilation.
pub struct StringInterner {
    inner: RwLock<Inner>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned at
    /// [`Name::EMPTY`].
    pub fn new() -> Self {
        let empty: &'static str = "";
        let mut map = FxHashMap::default();
        map.insert(empty, 0);
        StringInterner {
            inner: RwLock::new(Inner {
                map,
                strings: vec![empty],
            }),
        }
    }

    /// Try to intern a string, returning its `Name` or an error on
    /// overflow.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        {
            let inner = self.inner.read();
            if let Some(&idx) = inner.map.get(s) {
                return Ok(Name::from_raw(idx));
            }
        }

        let mut inner = self.inner.write();
        // Re-check: another caller may have interned between the locks.
        if let Some(&idx) = inner.map.get(s) {
            return Ok(Name::from_raw(idx));
        }

        let idx = u32::try_from(inner.strings.len()).map_err(|_| InternError::Overflow {
            count: inner.strings.len(),
        })?;
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        inner.map.insert(leaked, idx);
        inner.strings.push(leaked);
        Ok(Name::from_raw(idx))
    }

    /// Intern a string.
    ///
    /// # Panics
    /// Panics if the intern table overflows `u32::MAX` entries. Use
    /// [`try_intern`](Self::try_intern) for fallible conversion.
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Look up the string for a name.
    ///
    /// # Panics
    /// Panics if `name` was not produced by this interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.inner.read().strings[name.raw() as usize]
    }

    /// Number of interned strings, including the pre-interned empty
    /// string.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    /// Whether the interner holds no strings. Always false in practice
    /// since the empty string is pre-interned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
