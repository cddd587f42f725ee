//! In-memory storage engine for the notes server.
//!
//! A store hands out monotonically increasing `i64` identifiers and keeps
//! one value per identifier. Values can be looked up, replaced or removed by
//! identifier, and found or removed by equality.
//!
//! # Storage Backends
//!
//! All backends implement the [`Storage`] trait:
//!
//! - [`HashedStore`] -- `HashMap`-backed, O(1) id lookups
//! - [`LinkedStore`] -- singly linked chain with a tail index, O(1) appends
//!
//! A deployment picks one with [`Backend`] at startup and never mixes them.
//!
//! # Design Rules
//!
//! 1. Identifiers start at the store's initial id and only grow, until
//!    [`Storage::clear`] resets the counter (old ids are then reissued).
//! 2. A non-empty store holds values of a single [`TypeTag`]; writes with
//!    another tag fail with [`StoreError::TypeMismatch`] and change nothing.
//! 3. One reader/writer lock per store covers all of its state. Every
//!    operation is atomic; sequences of operations are not.
//! 4. Absence is not an error. Lookups return `None`.
//! 5. Snapshots returned by [`Storage::get_all`] are copies.

pub mod backend;
pub mod error;
pub mod hashed;
pub mod linked;
pub mod traits;
pub mod value;

// Re-export primary types at crate root for ergonomic imports.
pub use backend::Backend;
pub use error::{StoreError, StoreResult};
pub use hashed::HashedStore;
pub use linked::LinkedStore;
pub use traits::Storage;
pub use value::{Tagged, TypeTag, Value};
