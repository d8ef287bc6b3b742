//! Deterministic iteration over associative nodes.
//!
//! Hash map order changes between runs, and generated code must not. Every
//! consumer that emits output from a table walks it through `stablepairs`.

use std::vec;

use rustc_hash::FxHashSet;

use crate::error::{EmberError, Result};
use crate::node::Table;
use crate::value::{Key, Value};

// ============================================================================
// stablepairs
// ============================================================================

/// Iterator over a table's entries in a reproducible order.
///
/// The key order is fixed when the iterator is created; values are read as
/// iteration proceeds, so keys removed in the meantime are skipped.
pub struct StablePairs {
    table: Table,
    keys: vec::IntoIter<Key>,
}

impl Iterator for StablePairs {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let key = self.keys.next()?;
            if let Some(value) = self.table.get(&key) {
                return Some((key, value));
            }
        }
    }
}

/// Enumerate `table` deterministically.
///
/// Keys recorded by the reader come first, in source order, skipping any
/// that were removed since. Keys added later follow in ascending order of
/// their text; a node key contributes only its symbol name, comment text,
/// expr code or kind name, and equal labels fall back to creation order.
pub fn stablepairs(table: &Table) -> StablePairs {
    StablePairs {
        table: table.clone(),
        keys: stable_keys(table).into_iter(),
    }
}

fn stable_keys(table: &Table) -> Vec<Key> {
    let present = table.keys();
    let mut keys = Vec::with_capacity(present.len());
    let mut used: FxHashSet<Key> = FxHashSet::default();

    if let Some(order) = table.key_order() {
        for key in order {
            if table.contains_key(&key) && !used.contains(&key) {
                used.insert(key.clone());
                keys.push(key);
            }
        }
    }

    let mut rest: Vec<Key> = present.into_iter().filter(|k| !used.contains(k)).collect();
    rest.sort_by_cached_key(Key::sort_key);
    keys.extend(rest);
    keys
}

// ============================================================================
// allpairs
// ============================================================================

/// Iterator over a table's entries and those of its delegate chain.
pub struct AllPairs {
    current: Option<Table>,
    pending: StablePairs,
    seen_keys: FxHashSet<Key>,
    seen_tables: FxHashSet<usize>,
}

impl AllPairs {
    pub fn new(table: &Table) -> Self {
        let mut seen_tables = FxHashSet::default();
        seen_tables.insert(table.id());
        AllPairs {
            current: Some(table.clone()),
            pending: stablepairs(table),
            seen_keys: FxHashSet::default(),
            seen_tables,
        }
    }

    fn advance_level(&mut self) -> bool {
        let Some(next) = self.current.as_ref().and_then(Table::delegate) else {
            self.current = None;
            return false;
        };
        // A table already walked means the chain loops back on itself.
        if !self.seen_tables.insert(next.id()) {
            tracing::trace!(tables = self.seen_tables.len(), "delegate chain revisits a table");
            self.current = None;
            return false;
        }
        self.pending = stablepairs(&next);
        self.current = Some(next);
        true
    }
}

impl Iterator for AllPairs {
    type Item = (Key, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.current.as_ref()?;
        loop {
            match self.pending.next() {
                Some((key, value)) => {
                    if self.seen_keys.insert(key.clone()) {
                        return Some((key, value));
                    }
                }
                None => {
                    if !self.advance_level() {
                        return None;
                    }
                }
            }
        }
    }
}

/// Enumerate a table's own entries, then those inherited through its
/// delegate chain. A key shadowed by a closer table is yielded once, from
/// the closest one.
pub fn allpairs(value: &Value) -> Result<AllPairs> {
    match value.as_table() {
        Some(table) => Ok(AllPairs::new(table)),
        None => Err(EmberError::NotATable {
            found: value.type_name(),
        }),
    }
}

// ============================================================================
// Mapping helpers
// ============================================================================

/// Apply `f` to each item, keeping the values it returns.
pub fn map<F>(items: &[Value], f: F) -> Vec<Value>
where
    F: FnMut(&Value) -> Option<Value>,
{
    let mut out = Vec::with_capacity(items.len());
    map_into(items, f, &mut out);
    out
}

/// `map`, appending to an existing vector.
pub fn map_into<F>(items: &[Value], f: F, out: &mut Vec<Value>)
where
    F: FnMut(&Value) -> Option<Value>,
{
    out.extend(items.iter().filter_map(f));
}

/// What a `kvmap` callback produced for one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Mapped {
    /// Appended at the next positional key.
    Value(Value),
    /// Stored under the given key.
    Pair(Key, Value),
}

/// Apply `f` to each entry of `table` in stable order, collecting into a new
/// table. Entries for which `f` returns `None` are dropped.
pub fn kvmap<F>(table: &Table, f: F) -> Table
where
    F: FnMut(&Key, &Value) -> Option<Mapped>,
{
    let out = Table::new();
    kvmap_into(table, f, &out);
    out
}

/// `kvmap`, inserting into an existing table.
pub fn kvmap_into<F>(table: &Table, mut f: F, out: &Table)
where
    F: FnMut(&Key, &Value) -> Option<Mapped>,
{
    for (key, value) in stablepairs(table) {
        match f(&key, &value) {
            Some(Mapped::Value(v)) => out.push(v),
            Some(Mapped::Pair(k, v)) => {
                out.insert(k, v);
            }
            None => {}
        }
    }
}

/// A shallow copy of `from`; `None` copies nothing.
///
/// Only entries are copied. Recorded key order, delegate and span stay with
/// the original.
pub fn copy(from: Option<&Table>) -> Table {
    let out = Table::new();
    copy_into(from, &out);
    out
}

/// Copy every entry of `from` into `to`, overwriting existing keys.
pub fn copy_into(from: Option<&Table>, to: &Table) {
    let Some(from) = from else {
        return;
    };
    for (key, value) in from.entries() {
        to.insert(key, value);
    }
}

/// Whether `x` is one of `items`.
pub fn member(x: &Value, items: &[Value]) -> bool {
    items.iter().any(|item| item == x)
}

/// Whether `pred` holds for every item.
pub fn every<F>(items: &[Value], pred: F) -> bool
where
    F: FnMut(&Value) -> bool,
{
    items.iter().all(pred)
}
