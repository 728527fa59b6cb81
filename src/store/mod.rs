//! Persistence for monthly attendance records.
//!
//! Records are addressed by their composite key and always read and written
//! whole. Writes are conditional on the version that was read, so two
//! requests racing on the same month cannot silently drop each other's
//! punches: the loser gets [`StoreError::Conflict`].

use async_trait::async_trait;
use derive_more::{Display, Error, From};

use crate::model::attendance::MonthlyRecord;

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[derive(Debug, Display, From, Error)]
pub enum StoreError {
    #[display(fmt = "no record for key {}", _0)]
    #[from(ignore)]
    NotFound(#[error(not(source))] String),
    #[display(fmt = "record {} was modified by another request", _0)]
    #[from(ignore)]
    Conflict(#[error(not(source))] String),
    #[display(fmt = "stored record {} is unreadable: {}", key, reason)]
    #[from(ignore)]
    Corrupt { key: String, reason: String },
    #[display(fmt = "store backend error: {}", _0)]
    Backend(sqlx::Error),
}

#[async_trait]
pub trait TimecardStore: Send + Sync {
    /// Fetches the full record stored under `key`.
    ///
    /// A missing record is reported as [`StoreError::NotFound`], never as a
    /// backend error.
    async fn get(&self, key: &str) -> Result<MonthlyRecord, StoreError>;

    /// Replaces the whole record and returns its new version.
    ///
    /// Succeeds only if the stored version still equals `record.version`
    /// (a version of 0 means the key must not exist yet).
    async fn put(&self, record: &MonthlyRecord) -> Result<u64, StoreError>;
}
