use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, info, instrument};

use super::domain::{AddCostRequest, CostItem, MonthlyReport, ReportItem, ReportQuery};
use super::repository::{CostRepository, ReportCacheRepository, UserDirectory};
use super::validation::{is_month_in_past, month_range, parse_userid, validate_new_cost, validate_report_query};
use crate::clock::{Clock, SystemClock};
use crate::errors::{codes, ServiceError};

/// Monthly report engine and cost intake, independent of the web framework.
#[derive(Clone)]
pub struct ReportService {
    costs: Arc<dyn CostRepository>,
    cache: Arc<dyn ReportCacheRepository>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(
        costs: Arc<dyn CostRepository>,
        cache: Arc<dyn ReportCacheRepository>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self { costs, cache, users, clock: Arc::new(SystemClock) }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the report from stored costs. Never reads or writes the cache.
    #[instrument(skip(self))]
    pub async fn compute_report(&self, userid: i64, year: i32, month: u32) -> Result<MonthlyReport, ServiceError> {
        let (start, end) = month_range(year, month)?;
        let rows = self.costs.query_range(userid, start, end).await?;

        let mut report = MonthlyReport::empty(userid, year, month);
        for row in rows {
            if let Some(slot) = report.costs.iter_mut().find(|c| c.category == row.category) {
                slot.items.push(ReportItem { sum: row.sum, description: row.description, day: row.created_at.day() });
            }
        }
        Ok(report)
    }

    /// Past months are served from the cache (filled on first request);
    /// the current and future months are always computed fresh.
    #[instrument(skip(self))]
    pub async fn get_report(&self, userid: i64, year: i32, month: u32) -> Result<MonthlyReport, ServiceError> {
        if !is_month_in_past(year, month, self.clock.now()) {
            return self.compute_report(userid, year, month).await;
        }

        if let Some(doc) = self.cache.find_by_key(userid, year, month).await? {
            debug!(userid, year, month, event = "report_cache_hit");
            return serde_json::from_value(doc)
                .map_err(|e| ServiceError::Internal(format!("cached report unreadable: {e}")));
        }

        let report = self.compute_report(userid, year, month).await?;
        let doc = serde_json::to_value(&report).map_err(|e| ServiceError::Internal(e.to_string()))?;
        self.cache.upsert_by_key(userid, year, month, doc).await?;
        info!(userid, year, month, event = "report_cached");
        Ok(report)
    }

    /// Validate and persist one cost line. The owner must exist before the
    /// remaining fields are checked. Backdated entries are refused; a
    /// missing `created_at` means "now".
    #[instrument(skip(self, input))]
    pub async fn add_cost_item(&self, input: &AddCostRequest) -> Result<CostItem, ServiceError> {
        let userid = parse_userid(&input.userid)?;
        if !self.users.exists(userid).await? {
            return Err(ServiceError::user_not_found(userid));
        }
        let new = validate_new_cost(input)?;
        let now = self.clock.now();
        let created_at = new.created_at.unwrap_or(now);
        if created_at < now {
            return Err(ServiceError::validation(codes::COST_IN_PAST, "Cannot add costs in the past"));
        }

        let item = CostItem {
            userid: new.userid,
            description: new.description,
            category: new.category,
            sum: new.sum,
            created_at,
        };
        let stored = self.costs.insert(item).await?;
        info!(userid = stored.userid, category = %stored.category, event = "cost_added");
        Ok(stored)
    }

    /// Query-string entry point for `GET /api/report`.
    #[instrument(skip(self, query))]
    pub async fn report(&self, query: &ReportQuery) -> Result<MonthlyReport, ServiceError> {
        let key = validate_report_query(query)?;
        if !self.users.exists(key.userid).await? {
            return Err(ServiceError::user_not_found(key.userid));
        }
        self.get_report(key.userid, key.year, key.month).await
    }
}
