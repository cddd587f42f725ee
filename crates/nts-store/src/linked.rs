//! Singly linked store.
//!
//! Nodes live in a slot arena and link forward by slot index. The chain keeps
//! the index of its first node (which owns the rest of the chain through the
//! `next` links) and of its last node, so appends are O(1). Vacated slots go
//! on a free list and are reused by later appends.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::Storage;
use crate::value::{admit, matches_fixed, Tagged, TypeTag};

struct Node<V> {
    id: i64,
    value: V,
    next: Option<usize>,
}

/// The chain plus everything else the store's lock guards.
struct Chain<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    next_id: i64,
    fixed: Option<TypeTag>,
}

impl<V> Chain<V> {
    fn new(next_id: i64) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            next_id,
            fixed: None,
        }
    }

    fn node(&self, idx: usize) -> Option<&Node<V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<V>> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    fn iter(&self) -> Iter<'_, V> {
        Iter {
            chain: self,
            cursor: self.head,
        }
    }

    fn push_back(&mut self, id: i64, value: V) {
        let node = Node {
            id,
            value,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.tail.and_then(|t| self.node_mut(t)) {
            Some(last) => last.next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
    }

    /// Locate the first node satisfying `pred`, along with its predecessor.
    fn find(&self, mut pred: impl FnMut(&Node<V>) -> bool) -> Option<(Option<usize>, usize)> {
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let node = self.node(idx)?;
            if pred(node) {
                return Some((prev, idx));
            }
            prev = Some(idx);
            cursor = node.next;
        }
        None
    }

    /// Detach the node at `idx`, repairing its predecessor's link and the
    /// head/tail indices.
    fn unlink(&mut self, prev: Option<usize>, idx: usize) -> Option<Node<V>> {
        let node = self.slots.get_mut(idx)?.take()?;
        match prev.and_then(|p| self.node_mut(p)) {
            Some(before) => before.next = node.next,
            None => self.head = node.next,
        }
        if self.tail == Some(idx) {
            self.tail = prev;
        }
        self.free.push(idx);
        self.len -= 1;
        if self.len == 0 {
            self.fixed = None;
        }
        Some(node)
    }

    fn remove_first(&mut self, pred: impl FnMut(&Node<V>) -> bool) -> Option<Node<V>> {
        let (prev, idx) = self.find(pred)?;
        self.unlink(prev, idx)
    }

    fn reset(&mut self) {
        self.slots = Vec::new();
        self.free = Vec::new();
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.fixed = None;
    }
}

/// Walks the chain from head to tail.
struct Iter<'a, V> {
    chain: &'a Chain<V>,
    cursor: Option<usize>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a Node<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.chain.node(self.cursor?)?;
        self.cursor = node.next;
        Some(node)
    }
}

/// Singly-linked-list store.
///
/// Appends are O(1); lookups and removals walk the chain. Ids outside
/// `[initial_id, next_id)` are rejected without a walk since they were never
/// handed out.
pub struct LinkedStore<V> {
    initial_id: i64,
    chain: RwLock<Chain<V>>,
}

impl<V> LinkedStore<V> {
    /// Create an empty store whose first entry gets `initial_id`.
    pub fn new(initial_id: i64) -> Self {
        Self {
            initial_id,
            chain: RwLock::new(Chain::new(initial_id)),
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

    /// Ids in chain order.
    pub fn ids(&self) -> Vec<i64> {
        self.read().iter().map(|n| n.id).collect()
    }

    fn issued(&self, chain: &Chain<V>, id: i64) -> bool {
        (self.initial_id..chain.next_id).contains(&id)
    }

    // Writers never leave the chain half-linked, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Chain<V>> {
        self.chain.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Chain<V>> {
        self.chain.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> Storage<V> for LinkedStore<V>
where
    V: Tagged + Clone + PartialEq + Send + Sync,
{
    fn add(&self, value: V) -> StoreResult<i64> {
        let mut chain = self.write();
        let id = chain.next_id;
        let next = id.checked_add(1).ok_or(StoreError::IdsExhausted)?;
        admit(&mut chain.fixed, &value)?;

        chain.push_back(id, value);
        chain.next_id = next;
        debug!(id, "linked store: appended entry");
        Ok(id)
    }

    fn get_by_id(&self, id: i64) -> Option<V> {
        let chain = self.read();
        if !self.issued(&chain, id) {
            return None;
        }
        chain.iter().find(|n| n.id == id).map(|n| n.value.clone())
    }

    fn update_by_id(&self, id: i64, value: V) -> StoreResult<bool> {
        let mut chain = self.write();
        if chain.len == 0 {
            return Ok(false);
        }
        admit(&mut chain.fixed, &value)?;

        let Some((_, idx)) = chain.find(|n| n.id == id) else {
            return Ok(false);
        };
        match chain.node_mut(idx) {
            Some(node) => {
                node.value = value;
                debug!(id, "linked store: updated entry");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_by_id(&self, id: i64) -> bool {
        let mut chain = self.write();
        if !self.issued(&chain, id) {
            return false;
        }
        let removed = chain.remove_first(|n| n.id == id).is_some();
        if removed {
            debug!(id, "linked store: removed entry");
        }
        removed
    }

    fn remove_by_value(&self, value: &V) -> bool {
        let mut chain = self.write();
        if !matches_fixed(chain.fixed, value) {
            return false;
        }
        match chain.remove_first(|n| n.value == *value) {
            Some(node) => {
                debug!(id = node.id, "linked store: removed entry by value");
                true
            }
            None => false,
        }
    }

    fn remove_all_by_value(&self, value: &V) -> usize {
        let mut chain = self.write();
        if !matches_fixed(chain.fixed, value) {
            return 0;
        }
        // Each removal rescans from the head.
        let mut removed = 0;
        while chain.remove_first(|n| n.value == *value).is_some() {
            removed += 1;
        }
        debug!(removed, "linked store: removed all entries by value");
        removed
    }

    fn get_by_value(&self, value: &V) -> Option<i64> {
        let chain = self.read();
        if !matches_fixed(chain.fixed, value) {
            return None;
        }
        chain.iter().find(|n| n.value == *value).map(|n| n.id)
    }

    fn get_all_by_value(&self, value: &V) -> Option<Vec<i64>> {
        let chain = self.read();
        if !matches_fixed(chain.fixed, value) {
            return None;
        }
        let ids: Vec<i64> = chain
            .iter()
            .filter(|n| n.value == *value)
            .map(|n| n.id)
            .collect();
        (!ids.is_empty()).then_some(ids)
    }

    fn get_all(&self) -> Option<BTreeMap<i64, V>> {
        let chain = self.read();
        if chain.len == 0 {
            return None;
        }
        Some(chain.iter().map(|n| (n.id, n.value.clone())).collect())
    }

    fn len(&self) -> usize {
        self.read().len
    }

    fn clear(&self) {
        let mut chain = self.write();
        chain.reset();
        chain.next_id = self.initial_id;
        debug!(initial_id = self.initial_id, "linked store: cleared");
    }
}

/// Renders the chain as `[{id: value}, ...]`.
impl<V: fmt::Display> fmt::Display for LinkedStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.read();
        f.write_str("[")?;
        for (i, node) in chain.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{{{}: {}}}", node.id, node.value)?;
        }
        f.write_str("]")
    }
}

impl<V> fmt::Debug for LinkedStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.read();
        f.debug_struct("LinkedStore")
            .field("entry_count", &chain.len)
            .field("initial_id", &self.initial_id)
            .field("next_id", &chain.next_id)
            .finish()
    }
}
