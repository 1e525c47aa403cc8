use crate::error::{AppError, AppResult, ConflictField};
use crate::models::ShortUrlRecord;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{RecordStore, StoreStats};

#[derive(Default)]
struct Tables {
    next_id: i64,
    by_alias: HashMap<String, ShortUrlRecord>,
    alias_by_target: HashMap<String, String>,
}

/// In-process record store.
///
/// Both indexes live behind one lock so an insert checks and claims the
/// alias and the target in a single step.
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_by_target(&self, target_url: &str) -> AppResult<Option<ShortUrlRecord>> {
        let tables = self.tables.lock();
        Ok(tables
            .alias_by_target
            .get(target_url)
            .and_then(|alias| tables.by_alias.get(alias))
            .cloned())
    }

    async fn find_by_alias(&self, alias: &str) -> AppResult<Option<ShortUrlRecord>> {
        Ok(self.tables.lock().by_alias.get(alias).cloned())
    }

    async fn insert(&self, alias: &str, target_url: &str) -> AppResult<ShortUrlRecord> {
        let mut tables = self.tables.lock();

        if tables.by_alias.contains_key(alias) {
            return Err(AppError::UniqueConflict(ConflictField::Alias));
        }
        if tables.alias_by_target.contains_key(target_url) {
            return Err(AppError::UniqueConflict(ConflictField::Target));
        }

        tables.next_id += 1;
        let record = ShortUrlRecord {
            id: tables.next_id,
            alias: alias.to_string(),
            target_url: target_url.to_string(),
            is_flagged: false,
            created_at: Utc::now(),
        };

        tables
            .alias_by_target
            .insert(target_url.to_string(), alias.to_string());
        tables.by_alias.insert(alias.to_string(), record.clone());

        Ok(record)
    }

    async fn exists_alias(&self, alias: &str) -> AppResult<bool> {
        Ok(self.tables.lock().by_alias.contains_key(alias))
    }

    async fn set_flagged(&self, alias: &str, flagged: bool) -> AppResult<()> {
        if let Some(record) = self.tables.lock().by_alias.get_mut(alias) {
            record.is_flagged = flagged;
        }
        Ok(())
    }

    async fn stats(&self) -> AppResult<StoreStats> {
        let tables = self.tables.lock();
        Ok(StoreStats {
            total_records: tables.by_alias.len() as i64,
            flagged_records: tables.by_alias.values().filter(|r| r.is_flagged).count() as i64,
        })
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn migrate(&self) -> AppResult<()> {
        Ok(())
    }
}
