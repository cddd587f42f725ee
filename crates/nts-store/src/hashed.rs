use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::Storage;
use crate::value::{admit, matches_fixed, Tagged, TypeTag};

/// Everything the store's lock guards.
struct MapState<V> {
    entries: HashMap<i64, V>,
    next_id: i64,
    fixed: Option<TypeTag>,
}

impl<V: PartialEq> MapState<V> {
    /// Ids of entries equal to `value`, oldest first.
    fn matching_ids(&self, value: &V) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .entries
            .iter()
            .filter(|(_, v)| *v == value)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Id of the oldest entry equal to `value`. Ids grow with insertion, so
    /// the oldest entry is the one with the smallest id.
    fn first_match(&self, value: &V) -> Option<i64> {
        self.entries
            .iter()
            .filter(|(_, v)| *v == value)
            .map(|(id, _)| *id)
            .min()
    }

    fn release_type_if_empty(&mut self) {
        if self.entries.is_empty() {
            self.fixed = None;
        }
    }
}

/// `HashMap`-backed store.
///
/// Id lookups are O(1) on average. Value lookups scan every entry, which is
/// fine for the small collections this store is meant for.
pub struct HashedStore<V> {
    initial_id: i64,
    state: RwLock<MapState<V>>,
}

impl<V> HashedStore<V> {
    /// Create an empty store whose first entry gets `initial_id`.
    pub fn new(initial_id: i64) -> Self {
        Self {
            initial_id,
            state: RwLock::new(MapState {
                entries: HashMap::new(),
                next_id: initial_id,
                fixed: None,
            }),
        }
    }

    /// Identifier handed to the first entry after construction or a clear.
    pub fn initial_id(&self) -> i64 {
        self.initial_id
    }

    /// Identifier the next successful `add` will return.
    pub fn next_id(&self) -> i64 {
        self.read().next_id
    }

    /// Type currently fixed by the stored entries.
    pub fn fixed_type(&self) -> Option<TypeTag> {
        self.read().fixed
    }

    // A panic while the lock is held cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, MapState<V>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MapState<V>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> Storage<V> for HashedStore<V>
where
    V: Tagged + Clone + PartialEq + Send + Sync,
{
    fn add(&self, value: V) -> StoreResult<i64> {
        let mut state = self.write();
        let id = state.next_id;
        let next = id.checked_add(1).ok_or(StoreError::IdsExhausted)?;
        admit(&mut state.fixed, &value)?;

        state.entries.insert(id, value);
        state.next_id = next;
        debug!(id, "hashed store: added entry");
        Ok(id)
    }

    fn get_by_id(&self, id: i64) -> Option<V> {
        self.read().entries.get(&id).cloned()
    }

    fn update_by_id(&self, id: i64, value: V) -> StoreResult<bool> {
        let mut state = self.write();
        if state.entries.is_empty() {
            return Ok(false);
        }
        // The store is non-empty, so this only checks.
        admit(&mut state.fixed, &value)?;

        match state.entries.get_mut(&id) {
            Some(slot) => {
                *slot = value;
                debug!(id, "hashed store: updated entry");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_by_id(&self, id: i64) -> bool {
        let mut state = self.write();
        let removed = state.entries.remove(&id).is_some();
        state.release_type_if_empty();
        if removed {
            debug!(id, "hashed store: removed entry");
        }
        removed
    }

    fn remove_by_value(&self, value: &V) -> bool {
        let mut state = self.write();
        if !matches_fixed(state.fixed, value) {
            return false;
        }
        let Some(id) = state.first_match(value) else {
            return false;
        };
        state.entries.remove(&id);
        state.release_type_if_empty();
        debug!(id, "hashed store: removed entry by value");
        true
    }

    fn remove_all_by_value(&self, value: &V) -> usize {
        let mut state = self.write();
        if !matches_fixed(state.fixed, value) {
            return 0;
        }
        let before = state.entries.len();
        state.entries.retain(|_, v| *v != *value);
        let removed = before - state.entries.len();
        state.release_type_if_empty();
        debug!(removed, "hashed store: removed all entries by value");
        removed
    }

    fn get_by_value(&self, value: &V) -> Option<i64> {
        let state = self.read();
        if !matches_fixed(state.fixed, value) {
            return None;
        }
        state.first_match(value)
    }

    fn get_all_by_value(&self, value: &V) -> Option<Vec<i64>> {
        let state = self.read();
        if !matches_fixed(state.fixed, value) {
            return None;
        }
        let ids = state.matching_ids(value);
        (!ids.is_empty()).then_some(ids)
    }

    fn get_all(&self) -> Option<BTreeMap<i64, V>> {
        let state = self.read();
        if state.entries.is_empty() {
            return None;
        }
        Some(
            state
                .entries
                .iter()
                .map(|(id, v)| (*id, v.clone()))
                .collect(),
        )
    }

    fn len(&self) -> usize {
        self.read().entries.len()
    }

    fn clear(&self) {
        let mut state = self.write();
        state.entries = HashMap::new();
        state.fixed = None;
        state.next_id = self.initial_id;
        debug!(initial_id = self.initial_id, "hashed store: cleared");
    }
}

/// Renders the store as a two-column table ordered by id.
impl<V: fmt::Display> fmt::Display for HashedStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        let mut rows: Vec<(i64, String)> = state
            .entries
            .iter()
            .map(|(id, v)| (*id, v.to_string()))
            .collect();
        rows.sort_unstable_by_key(|(id, _)| *id);

        let id_width = rows
            .iter()
            .map(|(id, _)| id.to_string().len())
            .max()
            .unwrap_or(0)
            .max("ID".len());
        let value_width = rows
            .iter()
            .map(|(_, v)| v.chars().count())
            .max()
            .unwrap_or(0)
            .max("Value".len());

        writeln!(f, "{:<id_width$} | Value", "ID")?;
        writeln!(f, "{}", "-".repeat(id_width + 3 + value_width))?;
        for (id, value) in rows {
            writeln!(f, "{id:<id_width$} | {value}")?;
        }
        Ok(())
    }
}

impl<V> fmt::Debug for HashedStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("HashedStore")
            .field("entry_count", &state.entries.len())
            .field("initial_id", &self.initial_id)
            .field("next_id", &state.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn add_all(store: &HashedStore<String>, labels: &[&str]) -> Vec<i64> {
        labels
            .iter()
            .map(|n| store.add(n.to_string()).unwrap())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Insertion order on an unordered map
    // -----------------------------------------------------------------------

    #[test]
    fn value_lookups_follow_insertion_order() {
        let store = HashedStore::new(1);
        add_all(&store, &["x", "dup", "y", "dup", "z", "dup"]);

        assert_eq!(store.get_by_value(&"dup".to_string()), Some(2));
        assert_eq!(
            store.get_all_by_value(&"dup".to_string()),
            Some(vec![2, 4, 6])
        );
    }

    #[test]
    fn remove_by_value_removes_oldest_match() {
        let store = HashedStore::new(1);
        add_all(&store, &["dup", "a", "dup"]);

        assert!(store.remove_by_value(&"dup".to_string()));
        assert_eq!(store.get_by_id(1), None);
        assert_eq!(store.get_by_id(3), Some("dup".to_string()));
    }

    // -----------------------------------------------------------------------
    // Type descriptor lifecycle
    // -----------------------------------------------------------------------

    #[test]
    fn fixed_type_released_when_emptied() {
        let store = HashedStore::new(1);
        let id = store.add(Value::from("a")).unwrap();
        assert_eq!(store.fixed_type(), Some(TypeTag::new("string")));

        store.remove_by_id(id);
        assert_eq!(store.fixed_type(), None);

        // A different variant is accepted once the store is empty again.
        store.add(Value::from(5_i64)).unwrap();
        assert_eq!(store.fixed_type(), Some(TypeTag::new("int")));
    }

    #[test]
    fn fixed_type_released_by_remove_all() {
        let store = HashedStore::new(1);
        store.add(Value::from("a")).unwrap();
        store.add(Value::from("a")).unwrap();
        assert_eq!(store.remove_all_by_value(&Value::from("a")), 2);
        assert_eq!(store.fixed_type(), None);
    }

    #[test]
    fn exhausted_add_does_not_fix_type() {
        let store = HashedStore::new(i64::MAX);
        assert_eq!(store.add(Value::from("a")), Err(StoreError::IdsExhausted));
        assert_eq!(store.fixed_type(), None);
        assert_eq!(store.next_id(), i64::MAX);
    }

    #[test]
    fn update_rejects_other_variant_and_keeps_value() {
        let store = HashedStore::new(1);
        let id = store.add(Value::from("a")).unwrap();
        let err = store.update_by_id(id, Value::from(true)).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
        assert_eq!(store.get_by_id(id), Some(Value::from("a")));
    }

    // -----------------------------------------------------------------------
    // Snapshot isolation
    // -----------------------------------------------------------------------

    #[test]
    fn get_all_is_a_copy() {
        let store = HashedStore::new(1);
        add_all(&store, &["a", "b"]);
        let mut snapshot = store.get_all().unwrap();
        snapshot.insert(99, "c".into());
        store.remove_by_id(1);

        assert_eq!(snapshot.len(), 3);
        assert_eq!(store.len(), 1);
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_adds_get_distinct_ids() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(HashedStore::new(1));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..50)
                        .map(|i| store.add(t * 1000 + i).unwrap())
                        .collect::<Vec<i64>>()
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread should not panic"))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=400).collect::<Vec<i64>>());
        assert_eq!(store.next_id(), 401);
    }

    // -----------------------------------------------------------------------
    // Display / Debug
    // -----------------------------------------------------------------------

    #[test]
    fn display_renders_table_by_id() {
        let store = HashedStore::new(9);
        add_all(&store, &["alice", "bob", "carol"]);

        let out = store.to_string();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID | Value");
        assert_eq!(lines[1], "-".repeat(2 + 3 + 5));
        assert_eq!(lines[2], "9  | alice");
        assert_eq!(lines[3], "10 | bob");
        assert_eq!(lines[4], "11 | carol");
    }

    #[test]
    fn debug_format() {
        let store = HashedStore::new(1);
        store.add(1_i64).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("HashedStore"));
        assert!(debug.contains("entry_count: 1"));
        assert!(debug.contains("next_id: 2"));
    }
}
