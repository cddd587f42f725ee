use std::collections::BTreeMap;

use crate::error::StoreResult;

/// Id-keyed in-memory storage.
///
/// All implementations must satisfy these invariants:
/// - Identifiers are handed out in strictly increasing order, starting at the
///   store's initial identifier, until the next [`clear`](Storage::clear).
/// - All entries of a non-empty store share one [`TypeTag`](crate::TypeTag);
///   the fixed tag is released when the store becomes empty.
/// - Every operation is atomic on its own. Nothing is atomic across calls.
/// - Absence is never an error: lookups return `None`, removals report
///   whether they removed anything.
pub trait Storage<V>: Send + Sync {
    /// Store `value` under the next identifier and return that identifier.
    ///
    /// Fails with [`TypeMismatch`](crate::StoreError::TypeMismatch) if the
    /// store is non-empty and holds values of another type, and with
    /// [`IdsExhausted`](crate::StoreError::IdsExhausted) once the counter
    /// has reached `i64::MAX`. A failed add leaves the store unchanged.
    fn add(&self, value: V) -> StoreResult<i64>;

    /// Clone of the value stored under `id`.
    fn get_by_id(&self, id: i64) -> Option<V>;

    /// Replace the value stored under `id`.
    ///
    /// Returns `Ok(false)` if no entry has this id (an empty store never
    /// has it), and `TypeMismatch` if `value` has a different type than the
    /// stored entries.
    fn update_by_id(&self, id: i64, value: V) -> StoreResult<bool>;

    /// Remove the entry stored under `id`. Returns `true` if it existed.
    fn remove_by_id(&self, id: i64) -> bool;

    /// Remove the oldest entry equal to `value`. Returns `true` if one was
    /// removed.
    fn remove_by_value(&self, value: &V) -> bool;

    /// Remove every entry equal to `value` and return how many were removed.
    fn remove_all_by_value(&self, value: &V) -> usize;

    /// Identifier of the oldest entry equal to `value`.
    fn get_by_value(&self, value: &V) -> Option<i64>;

    /// Identifiers of all entries equal to `value`, oldest first. `None` if
    /// there are none.
    fn get_all_by_value(&self, value: &V) -> Option<Vec<i64>>;

    /// Snapshot of all entries keyed by identifier. `None` if the store is
    /// empty.
    ///
    /// The snapshot is a copy; it is safe to use without further locking.
    fn get_all(&self) -> Option<BTreeMap<i64, V>>;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and reset the identifier counter.
    ///
    /// Identifiers handed out before the clear will be handed out again.
    fn clear(&self);
}
