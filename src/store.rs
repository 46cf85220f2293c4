use std::fmt::Write;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::student::{IdError, Record, StudentId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    InvalidId(#[from] IdError),
    #[error("student id {id} derives index {index} outside table of {capacity} slots")]
    IndexOutOfRange { id: String, index: i128, capacity: usize },
}

/// Direct-addressed table of student records.
///
/// Each id maps to exactly one slot. Two ids deriving the same slot are not
/// chained: the later insert replaces the earlier record.
pub struct RecordStore {
    config: StoreConfig,
    slots: Vec<Option<Record>>,
    len: usize,
}

impl RecordStore {
    pub fn new(config: StoreConfig) -> Self {
        let slots = storage(config.table_size);
        Self { config, slots, len: 0 }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn parse_id(&self, raw: &str) -> Result<StudentId, IdError> {
        StudentId::parse(raw, &self.config)
    }

    /// Concatenates year offset, department position and roll digits, then
    /// subtracts the seed.
    pub fn index_of(&self, id: &StudentId) -> Result<usize, StoreError> {
        let year_offset = i32::from(id.year()) - i32::from(self.config.base_year);
        let mut digits = String::with_capacity(self.config.id_length);
        // writing into a String cannot fail
        let _ = write!(digits, "{}{}{}", year_offset, id.dept(), id.roll());

        let out_of_range = |index: i128| StoreError::IndexOutOfRange {
            id: id.to_string(),
            index,
            capacity: self.capacity(),
        };
        let joined = match digits.parse::<u64>() {
            Ok(joined) => joined,
            Err(_) => return Err(out_of_range(i128::MAX)),
        };
        let index = i128::from(joined) - i128::from(self.config.hashing_seed);
        match usize::try_from(index) {
            Ok(index) if index < self.capacity() => Ok(index),
            _ => Err(out_of_range(index)),
        }
    }

    /// Stores the record and returns whatever occupied its slot before.
    pub fn try_insert(&mut self, raw: &str, cgpa: f64) -> Result<Option<Record>, StoreError> {
        let id = self.parse_id(raw)?;
        let index = self.index_of(&id)?;
        let previous = self.slots[index].replace(Record { id, cgpa });
        if previous.is_none() {
            self.len += 1;
        }
        Ok(previous)
    }

    /// Logging wrapper around [`RecordStore::try_insert`]; `false` means the
    /// record was not stored.
    pub fn insert(&mut self, raw: &str, cgpa: f64) -> bool {
        match self.try_insert(raw, cgpa) {
            Ok(Some(previous)) => {
                warn!(id = raw, previous = %previous.id, previous_cgpa = previous.cgpa, "overwrote occupied slot");
                true
            }
            Ok(None) => {
                debug!(id = raw, cgpa, "inserted record");
                true
            }
            Err(err) => {
                warn!(id = raw, error = %err, "failed to insert record");
                false
            }
        }
    }

    pub fn try_get(&self, raw: &str) -> Result<Option<f64>, StoreError> {
        let id = self.parse_id(raw)?;
        let index = self.index_of(&id)?;
        Ok(self.slots[index].as_ref().map(|record| record.cgpa))
    }

    pub fn get(&self, raw: &str) -> Option<f64> {
        match self.try_get(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(id = raw, error = %err, "failed to look up record");
                None
            }
        }
    }

    pub fn slots(&self) -> &[Option<Record>] {
        &self.slots
    }

    /// Occupied slots in index order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.slots.iter().flatten()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.len = 0;
    }
}

#[inline]
fn storage(size: usize) -> Vec<Option<Record>> {
    let mut result: Vec<Option<Record>> = Vec::with_capacity(size);
    for _ in 0..size {
        result.push(None);
    }
    result
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::DEPARTMENTS;

    fn store() -> RecordStore {
        RecordStore::new(StoreConfig::default())
    }

    #[test]
    fn index_concatenates_fields() {
        let store = store();
        let id = store.parse_id("2010CSE0000").unwrap();
        assert_eq!(store.index_of(&id).unwrap(), 0);
        let id = store.parse_id("2014MEC1231").unwrap();
        assert_eq!(store.index_of(&id).unwrap(), 1_411_231 - 1_000_000);
        let id = store.parse_id("2016ARC9999").unwrap();
        assert_eq!(store.index_of(&id).unwrap(), 639_999);
    }

    #[test]
    fn index_beyond_capacity_is_rejected() {
        let config = StoreConfig { table_size: 100, ..StoreConfig::default() };
        let store = RecordStore::new(config);
        let id = store.parse_id("2010CSE0100").unwrap();
        assert!(matches!(
            store.index_of(&id),
            Err(StoreError::IndexOutOfRange { index: 100, capacity: 100, .. })
        ));
    }

    #[test]
    fn index_below_seed_is_rejected() {
        let config = StoreConfig { hashing_seed: 2_000_000, ..StoreConfig::default() };
        let store = RecordStore::new(config);
        let id = store.parse_id("2012CSE0001").unwrap();
        assert!(matches!(store.index_of(&id), Err(StoreError::IndexOutOfRange { .. })));
    }

    #[test]
    fn insert_then_get() {
        let mut store = store();
        assert!(store.insert("2012CSE0001", 9.0));
        assert_eq!(store.get("2012CSE0001"), Some(9.0));
        assert_eq!(store.get("2012CSE0002"), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalid_ids_are_not_found() {
        let mut store = store();
        assert!(!store.insert("2000CSE1234", 4.5));
        assert!(!store.insert("20CSE1234", 4.5));
        assert_eq!(store.get("2010C3E1234"), None);
        assert!(matches!(store.try_get("20a0CSE1234"), Err(StoreError::InvalidId(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn reinsert_overwrites() {
        let mut store = store();
        assert_eq!(store.try_insert("2011CSE0011", 7.0).unwrap(), None);
        let previous = store.try_insert("2011CSE0011", 8.0).unwrap();
        assert_eq!(previous.map(|r| r.cgpa), Some(7.0));
        assert_eq!(store.get("2011CSE0011"), Some(8.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn collision_returns_stored_value_for_other_id() {
        // year offset 11 + dept 1 == year offset 1 + dept 11 once more than ten departments exist
        let mut departments: Vec<String> = (0..12).map(|i| format!("D{}X", (b'A' + i) as char)).collect();
        departments[1] = "CSE".to_string();
        departments[11] = "MEC".to_string();
        let config = StoreConfig {
            departments,
            base_year: 2000,
            min_year: 2001,
            max_year: 2016,
            hashing_seed: 0,
            table_size: 2_000_000,
            ..StoreConfig::default()
        };
        let mut store = RecordStore::new(config);
        let a = store.parse_id("2011CSE0005").unwrap();
        let b = store.parse_id("2001MEC0005").unwrap();
        assert_eq!(store.index_of(&a).unwrap(), store.index_of(&b).unwrap());

        store.insert("2011CSE0005", 6.0);
        store.insert("2001MEC0005", 9.5);
        assert_eq!(store.get("2011CSE0005"), Some(9.5));
        assert_eq!(store.records().next().map(|r| r.id.as_str()), Some("2001MEC0005"));
    }

    #[test]
    fn clear_empties_every_slot() {
        let mut store = store();
        store.insert("2012CSE0001", 9.0);
        store.insert("2013ECE0042", 7.25);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.records().count(), 0);
        assert_eq!(store.capacity(), 650_000);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn valid_ids_fit_the_table(year in 2010u16..=2016, dept in 0usize..4, roll in 0u32..10_000) {
            let store = store();
            let raw = format!("{year}{}{roll:04}", DEPARTMENTS[dept]);
            let id = store.parse_id(&raw).unwrap();
            prop_assert!(store.index_of(&id).unwrap() < store.capacity());
        }

        #[test]
        fn lookup_returns_inserted_value(year in 2010u16..=2016, dept in 0usize..4, roll in 0u32..10_000, cgpa in 0.0f64..10.0) {
            let mut store = store();
            let raw = format!("{year}{}{roll:04}", DEPARTMENTS[dept]);
            prop_assert!(store.insert(&raw, cgpa));
            prop_assert_eq!(store.get(&raw), Some(cgpa));
        }
    }
}
