use async_trait::async_trait;
use sqlx::{MySqlPool, types::Json};
use tracing::debug;

use super::{StoreError, TimecardStore};
use crate::model::attendance::{DayEntry, MonthlyRecord};

/// MySQL-backed store: one row per `<user>-<YYYY-MM>` key, entries kept as
/// a JSON array.
pub struct MySqlTimecardStore {
    pool: MySqlPool,
    table: String,
}

impl MySqlTimecardStore {
    pub fn new(pool: MySqlPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }
}

fn select_sql(table: &str) -> String {
    format!(
        "SELECT records, version FROM {} WHERE user_month_key = ?",
        table
    )
}

// A duplicate key means another request created the month first
fn insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {} (user_month_key, records, version) VALUES (?, ?, 1)",
        table
    )
}

// Matches no row once another writer has bumped the version
fn update_sql(table: &str) -> String {
    format!(
        "UPDATE {} SET records = ?, version = version + 1 \
         WHERE user_month_key = ? AND version = ?",
        table
    )
}

#[async_trait]
impl TimecardStore for MySqlTimecardStore {
    async fn get(&self, key: &str) -> Result<MonthlyRecord, StoreError> {
        let sql = select_sql(&self.table);

        let row = sqlx::query_as::<_, (Json<Vec<DayEntry>>, u64)>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::ColumnDecode { source, .. } => StoreError::Corrupt {
                    key: key.to_string(),
                    reason: source.to_string(),
                },
                other => StoreError::Backend(other),
            })?;

        match row {
            Some((Json(entries), version)) => Ok(MonthlyRecord {
                key: key.to_string(),
                entries,
                version,
            }),
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn put(&self, record: &MonthlyRecord) -> Result<u64, StoreError> {
        let entries = Json(&record.entries);

        if record.version == 0 {
            let sql = insert_sql(&self.table);
            let result = sqlx::query(&sql)
                .bind(&record.key)
                .bind(entries)
                .execute(&self.pool)
                .await;

            return match result {
                Ok(_) => {
                    debug!(key = %record.key, "timecard record created");
                    Ok(1)
                }
                // Someone else created this month's record first
                Err(sqlx::Error::Database(db_err))
                    if db_err.code().as_deref() == Some("23000") =>
                {
                    Err(StoreError::Conflict(record.key.clone()))
                }
                Err(e) => Err(StoreError::Backend(e)),
            };
        }

        let sql = update_sql(&self.table);
        let result = sqlx::query(&sql)
            .bind(entries)
            .bind(&record.key)
            .bind(record.version)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(record.key.clone()));
        }

        debug!(key = %record.key, version = record.version + 1, "timecard record updated");
        Ok(record.version + 1)
    }
}
