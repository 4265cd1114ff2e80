use std::collections::{BTreeMap, HashMap};

/// Backing store for a secondary index: an ordered map from the index's own
/// encoded key to the projected value, plus a reverse index from the base
/// table's storage key so a mutation or delete on the table can find and
/// remove the corresponding index entry in one step.
///
/// Ordered by `BTreeMap` (not `HashMap`) so index queries get the same
/// range-scan pagination as the base table instead of a full materialize.
#[derive(Debug)]
pub struct IndexStorage<V> {
    data: BTreeMap<Vec<u8>, V>,
    reverse_index: HashMap<Vec<u8>, Vec<u8>>,
}

impl<V> IndexStorage<V> {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            reverse_index: HashMap::new(),
        }
    }

    pub fn put(&mut self, table_key: Vec<u8>, index_key: Vec<u8>, value: V) -> Option<V> {
        let old = self.remove_by_table_key(&table_key);

        self.reverse_index.insert(table_key, index_key.clone());
        self.data.insert(index_key, value);

        old
    }

    pub fn get(&self, index_key: &[u8]) -> Option<&V> {
        self.data.get(index_key)
    }

    pub fn remove_by_table_key(&mut self, table_key: &[u8]) -> Option<V> {
        if let Some(index_key) = self.reverse_index.remove(table_key) {
            self.data.remove(&index_key)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.reverse_index.clear();
    }

    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.data.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &V)> {
        self.data.iter()
    }

    /// Entries whose index key falls in `[prefix, prefix_upper)`, i.e. all
    /// entries belonging to one index partition, in key order.
    pub fn range_with_prefix<'a>(&'a self, prefix: &'a [u8]) -> impl Iterator<Item = (&'a Vec<u8>, &'a V)> {
        self.data
            .range(prefix.to_vec()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
    }

    #[cfg(test)]
    pub fn reverse_index_len(&self) -> usize {
        self.reverse_index.len()
    }
}

impl<V> Default for IndexStorage<V> {
    fn default() -> Self {
        Self::new()
    }
}
