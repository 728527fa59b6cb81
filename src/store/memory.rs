use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{StoreError, TimecardStore};
use crate::model::attendance::MonthlyRecord;

/// In-process store with the same version rules as the MySQL one.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, MonthlyRecord>>,
    puts: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn with_record(record: MonthlyRecord) -> Self {
        let store = Self::default();
        store.seed(record);
        store
    }

    /// Stores `record` as if it had been written once.
    pub fn seed(&self, mut record: MonthlyRecord) {
        record.version = record.version.max(1);
        self.records
            .lock()
            .unwrap()
            .insert(record.key.clone(), record);
    }

    pub fn record(&self, key: &str) -> Option<MonthlyRecord> {
        self.records.lock().unwrap().get(key).cloned()
    }

    /// Number of successful writes.
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Makes every call fail as if the database were down.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl TimecardStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<MonthlyRecord, StoreError> {
        self.check_available()?;
        self.record(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn put(&self, record: &MonthlyRecord) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        let stored_version = records.get(&record.key).map_or(0, |r| r.version);
        if stored_version != record.version {
            return Err(StoreError::Conflict(record.key.clone()));
        }

        let mut next = record.clone();
        next.version = record.version + 1;
        records.insert(next.key.clone(), next);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(record.version + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> MonthlyRecord {
        let mut record = MonthlyRecord::new("U1-2024-03".into());
        record.punch_in(
            NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        );
        record
    }

    #[actix_web::test]
    async fn missing_key_is_not_found() {
        let store = MemoryStore::default();
        let err = store.get("U1-2024-03").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(key) if key == "U1-2024-03"));
    }

    #[actix_web::test]
    async fn outage_is_not_mistaken_for_missing() {
        let store = MemoryStore::default();
        store.set_unavailable(true);
        let err = store.get("U1-2024-03").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[actix_web::test]
    async fn stale_write_is_rejected() {
        let store = MemoryStore::default();
        let first = record();
        assert_eq!(store.put(&first).await.unwrap(), 1);

        // A second writer that also read "no record" loses.
        let err = store.put(&first).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let mut current = store.get("U1-2024-03").await.unwrap();
        assert_eq!(current.version, 1);
        current.entries.clear();
        assert_eq!(store.put(&current).await.unwrap(), 2);
        assert_eq!(store.puts(), 2);
    }
}
