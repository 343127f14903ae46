//! Source id to name side table with string interning

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::SourceId;

/// Maps source ids to names. Equal names share a single allocation.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    by_source: HashMap<SourceId, Arc<str>>,
    interned: HashSet<Arc<str>>,
}

impl NameTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_source: HashMap::with_capacity(capacity),
            interned: HashSet::new(),
        }
    }

    /// Associates `name` with `source_id`, replacing any previous entry.
    pub fn insert(&mut self, source_id: SourceId, name: &str) {
        let interned = self.intern(name);
        self.by_source.insert(source_id, interned);
    }

    pub fn get(&self, source_id: SourceId) -> Option<&str> {
        self.by_source.get(&source_id).map(AsRef::as_ref)
    }

    pub fn contains(&self, source_id: SourceId) -> bool {
        self.by_source.contains_key(&source_id)
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    /// Number of distinct strings held by the interner
    pub fn distinct_names(&self) -> usize {
        self.interned.len()
    }

    /// Iterates over all names, one entry per source id
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.by_source.values().map(AsRef::as_ref)
    }

    /// Keeps only the entries whose source id satisfies `keep`, then drops
    /// interned strings no longer referenced by any entry.
    pub fn retain(&mut self, mut keep: impl FnMut(SourceId) -> bool) {
        self.by_source.retain(|source_id, _| keep(*source_id));
        self.by_source.shrink_to_fit();
        // Only the interner itself still holds a reference.
        self.interned.retain(|name| Arc::strong_count(name) > 1);
        self.interned.shrink_to_fit();
    }

    fn intern(&mut self, name: &str) -> Arc<str> {
        if let Some(existing) = self.interned.get(name) {
            return Arc::clone(existing);
        }
        let name: Arc<str> = Arc::from(name);
        self.interned.insert(Arc::clone(&name));
        name
    }
}
