//! Seams between the query core and whatever holds the datapoints.
//!
//! Catalogs and row stores are read fresh on every call; any caching belongs
//! to an implementation, never to the callers.

use std::collections::{BTreeMap, BTreeSet};

use crate::datatype::{Datapoint, Frequency, QueryFilter};
use crate::error::Result;

/// The frequencies and names a filter may refer to.
pub trait NameCatalog {
    fn frequencies(&self) -> Result<BTreeSet<Frequency>>;
    fn names(&self, freq: Frequency) -> Result<BTreeSet<String>>;
}

/// Rows matching a filter, ascending by date.
pub trait RowStore {
    fn select(&self, filter: &QueryFilter) -> Result<Vec<Datapoint>>;
}

/// Fixed catalog, mostly useful when no store is around.
impl NameCatalog for BTreeMap<Frequency, BTreeSet<String>> {
    fn frequencies(&self) -> Result<BTreeSet<Frequency>> {
        Ok(self.keys().copied().collect())
    }
    fn names(&self, freq: Frequency) -> Result<BTreeSet<String>> {
        Ok(self.get(&freq).cloned().unwrap_or_default())
    }
}
