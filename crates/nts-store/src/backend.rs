use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::hashed::HashedStore;
use crate::linked::LinkedStore;
use crate::traits::Storage;
use crate::value::Tagged;

/// Which storage implementation a deployment runs on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// [`HashedStore`]: O(1) id lookups.
    #[default]
    Hashed,
    /// [`LinkedStore`]: O(1) appends, O(n) lookups.
    Linked,
}

impl Backend {
    /// Build an empty store of this kind whose first entry gets `initial_id`.
    pub fn open<V>(self, initial_id: i64) -> Arc<dyn Storage<V>>
    where
        V: Tagged + Clone + PartialEq + Send + Sync + 'static,
    {
        match self {
            Self::Hashed => Arc::new(HashedStore::new(initial_id)),
            Self::Linked => Arc::new(LinkedStore::new(initial_id)),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hashed => write!(f, "hashed"),
            Self::Linked => write!(f, "linked"),
        }
    }
}

impl FromStr for Backend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashed" | "map" => Ok(Self::Hashed),
            "linked" | "list" => Ok(Self::Linked),
            _ => Err(StoreError::UnknownBackend(s.to_string())),
        }
    }
}
