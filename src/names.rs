// Name interning for the whole simulator.
// Every identifier that appears in a circuit definition (device names,
// port names, keywords) is mapped to a dense integer id; the id doubles
// as the index into the table for reverse lookup.

use std::collections::HashMap;

/// Dense identifier for an interned name. Ids are allocated in
/// first-seen order and stay stable for the life of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(pub u32);

impl NameId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only identifier table.
///
/// `lookup` interns, `query` is the non-inserting probe, `name_string`
/// is the reverse direction. Cleared only by dropping the session on a
/// circuit reload.
#[derive(Debug, Default)]
pub struct Names {
    strings: Vec<String>,
    index: HashMap<String, NameId>,
}

impl Names {
    #[must_use]
    pub fn new() -> Self {
        Names {
            strings: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Interns a single name, returning its id. Idempotent.
    /// Empty strings are rejected and produce no id.
    pub fn intern(&mut self, name: &str) -> Option<NameId> {
        if name.is_empty() {
            return None;
        }
        if let Some(&id) = self.index.get(name) {
            return Some(id);
        }
        let id = NameId(self.strings.len() as u32);
        self.strings.push(name.to_string());
        self.index.insert(name.to_string(), id);
        Some(id)
    }

    /// Interns a batch of names in order, returning one id per accepted
    /// string. Empty strings are silently skipped.
    pub fn lookup(&mut self, names: &[&str]) -> Vec<NameId> {
        names.iter().filter_map(|n| self.intern(n)).collect()
    }

    /// Returns the id of an already-interned name, or `None` if the
    /// string has never been seen.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<NameId> {
        self.index.get(name).copied()
    }

    /// Reverse lookup: the string for `id`, or `None` if the id is out
    /// of range.
    #[must_use]
    pub fn name_string(&self, id: NameId) -> Option<&str> {
        self.strings.get(id.index()).map(String::as_str)
    }

    /// Number of distinct names interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
