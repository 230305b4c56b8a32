use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::costs::domain::{Category, CostItem};
use crate::costs::repository::{CostRepository, ReportCacheRepository, UserDirectory};
use crate::errors::ServiceError;

fn to_item(row: models::cost::Model) -> Result<CostItem, ServiceError> {
    let category = Category::parse(&row.category)
        .ok_or_else(|| ServiceError::Internal(format!("stored cost {} has unknown category {}", row.id, row.category)))?;
    Ok(CostItem {
        userid: row.userid,
        description: row.description,
        category,
        sum: row.sum,
        created_at: row.created_at.with_timezone(&Utc),
    })
}

pub struct SeaOrmCostRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl CostRepository for SeaOrmCostRepository {
    async fn insert(&self, item: CostItem) -> Result<CostItem, ServiceError> {
        let row = models::cost::create(&self.db, item.userid, &item.description, item.category.as_str(), item.sum, item.created_at).await?;
        to_item(row)
    }

    async fn query_range(&self, userid: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<CostItem>, ServiceError> {
        models::cost::list_in_range(&self.db, userid, start, end)
            .await?
            .into_iter()
            .map(to_item)
            .collect()
    }
}

pub struct SeaOrmReportCache {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl ReportCacheRepository for SeaOrmReportCache {
    async fn find_by_key(&self, userid: i64, year: i32, month: u32) -> Result<Option<serde_json::Value>, ServiceError> {
        let row = models::report::find_by_key(&self.db, userid, year, month as i32).await?;
        Ok(row.map(|r| r.report_json))
    }

    async fn upsert_by_key(&self, userid: i64, year: i32, month: u32, doc: serde_json::Value) -> Result<(), ServiceError> {
        models::report::upsert(&self.db, userid, year, month as i32, doc).await?;
        Ok(())
    }
}

/// Local `users` table lookup, used when no users service is configured.
pub struct SeaOrmUserDirectory {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl UserDirectory for SeaOrmUserDirectory {
    async fn exists(&self, userid: i64) -> Result<bool, ServiceError> {
        Ok(models::users::exists(&self.db, userid).await?)
    }
}
