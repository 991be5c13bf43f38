use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::info;

use crate::datatype::{Datapoint, Frequency, QueryFilter};
use crate::error::Result;
use crate::persist::{Criteria, PersistenceMode, Persistor};
use crate::store::{NameCatalog, RowStore};

/// Shared handle on the datapoint store. Every call takes the lock once, so
/// each read sees one consistent state.
pub struct Database {
    pub persistor: Mutex<Persistor>,
}

impl Database {
    pub fn new(mode: PersistenceMode) -> Result<Self> {
        let persistor = Persistor::new(&mode)?;
        info!(?mode, "datapoint store opened");
        Ok(Self { persistor: Mutex::new(persistor) })
    }
    pub fn upsert(&self, datapoints: &[Datapoint]) -> Result<usize> {
        self.persistor.lock()?.upsert(datapoints)
    }
    pub fn delete(&self, criteria: &Criteria) -> Result<usize> {
        self.persistor.lock()?.delete(criteria)
    }
    pub fn all_names(&self) -> Result<BTreeSet<String>> {
        self.persistor.lock()?.names(None)
    }
    pub fn date_range(&self, name: &str, freq: Frequency) -> Result<Option<(NaiveDate, NaiveDate)>> {
        self.persistor.lock()?.date_range(name, freq)
    }
}

impl NameCatalog for Database {
    fn frequencies(&self) -> Result<BTreeSet<Frequency>> {
        self.persistor.lock()?.frequencies()
    }
    fn names(&self, freq: Frequency) -> Result<BTreeSet<String>> {
        self.persistor.lock()?.names(Some(freq))
    }
}

impl RowStore for Database {
    fn select(&self, filter: &QueryFilter) -> Result<Vec<Datapoint>> {
        self.persistor.lock()?.select(filter)
    }
}
