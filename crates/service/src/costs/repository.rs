use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::CostItem;
use crate::errors::ServiceError;

/// Append-only cost storage.
#[async_trait]
pub trait CostRepository: Send + Sync {
    async fn insert(&self, item: CostItem) -> Result<CostItem, ServiceError>;
    /// Items of `userid` with `start <= created_at < end`, oldest first,
    /// ties in insertion order.
    async fn query_range(&self, userid: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<CostItem>, ServiceError>;
}

/// Computed report documents keyed by (userid, year, month).
#[async_trait]
pub trait ReportCacheRepository: Send + Sync {
    async fn find_by_key(&self, userid: i64, year: i32, month: u32) -> Result<Option<serde_json::Value>, ServiceError>;
    /// Insert or replace.
    async fn upsert_by_key(&self, userid: i64, year: i32, month: u32, doc: serde_json::Value) -> Result<(), ServiceError>;
}

/// Answers "does this user exist?".
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn exists(&self, userid: i64) -> Result<bool, ServiceError>;
}

/// In-memory implementations for tests and local runs
pub mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryCostRepository {
        items: Mutex<Vec<CostItem>>,
    }

    impl MemoryCostRepository {
        pub fn len(&self) -> usize {
            self.items.lock().unwrap_or_else(|p| p.into_inner()).len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl CostRepository for MemoryCostRepository {
        async fn insert(&self, item: CostItem) -> Result<CostItem, ServiceError> {
            let mut items = self.items.lock().unwrap_or_else(|p| p.into_inner());
            items.push(item.clone());
            Ok(item)
        }

        async fn query_range(&self, userid: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<CostItem>, ServiceError> {
            let items = self.items.lock().unwrap_or_else(|p| p.into_inner());
            let mut out: Vec<CostItem> = items
                .iter()
                .filter(|c| c.userid == userid && c.created_at >= start && c.created_at < end)
                .cloned()
                .collect();
            // stable: equal timestamps keep insertion order
            out.sort_by_key(|c| c.created_at);
            Ok(out)
        }
    }

    #[derive(Default)]
    pub struct MemoryReportCache {
        docs: Mutex<HashMap<(i64, i32, u32), serde_json::Value>>,
    }

    impl MemoryReportCache {
        pub fn len(&self) -> usize {
            self.docs.lock().unwrap_or_else(|p| p.into_inner()).len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl ReportCacheRepository for MemoryReportCache {
        async fn find_by_key(&self, userid: i64, year: i32, month: u32) -> Result<Option<serde_json::Value>, ServiceError> {
            let docs = self.docs.lock().unwrap_or_else(|p| p.into_inner());
            Ok(docs.get(&(userid, year, month)).cloned())
        }

        async fn upsert_by_key(&self, userid: i64, year: i32, month: u32, doc: serde_json::Value) -> Result<(), ServiceError> {
            let mut docs = self.docs.lock().unwrap_or_else(|p| p.into_inner());
            docs.insert((userid, year, month), doc);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct MemoryUserDirectory {
        ids: Mutex<HashSet<i64>>,
    }

    impl MemoryUserDirectory {
        pub fn with_users(ids: impl IntoIterator<Item = i64>) -> Self {
            Self { ids: Mutex::new(ids.into_iter().collect()) }
        }
    }

    #[async_trait]
    impl UserDirectory for MemoryUserDirectory {
        async fn exists(&self, userid: i64) -> Result<bool, ServiceError> {
            Ok(self.ids.lock().unwrap_or_else(|p| p.into_inner()).contains(&userid))
        }
    }
}
