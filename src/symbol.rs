// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Symbol values.
//!
//! Symbols are equal iff they share identity, never by description (§9
//! "Symbol identity"). We model identity with a process-unique integer
//! minted from an atomic counter rather than a heap address, since there is
//! no GC-managed arena backing this crate's values.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
pub struct Symbol {
    id: u64,
    description: Option<std::rc::Rc<str>>,
}

impl Symbol {
    pub fn new(description: Option<&str>) -> Self {
        let id = NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            description: description.map(std::rc::Rc::from),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

/// Well-known symbols, interned once per [`crate::vm::Vm`] and cached on it
/// (§3 "cached well-known symbols"). `Registry for` clause (symbols) is
/// installed before anything that might reference them, matching the
/// priority ordering `Symbol < everything else` decided in
/// `SPEC_FULL.md` §12.3.
#[derive(Debug, Clone)]
pub struct WellKnownSymbols {
    pub iterator: Symbol,
    pub async_iterator: Symbol,
    pub to_string_tag: Symbol,
    pub to_primitive: Symbol,
    pub has_instance: Symbol,
}

impl WellKnownSymbols {
    pub fn new() -> Self {
        Self {
            iterator: Symbol::new(Some("Symbol.iterator")),
            async_iterator: Symbol::new(Some("Symbol.asyncIterator")),
            to_string_tag: Symbol::new(Some("Symbol.toStringTag")),
            to_primitive: Symbol::new(Some("Symbol.toPrimitive")),
            has_instance: Symbol::new(Some("Symbol.hasInstance")),
        }
    }
}

impl Default for WellKnownSymbols {
    fn default() -> Self {
        Self::new()
    }
}
