//! Input validation for the costs endpoints and the calendar helpers the
//! report engine relies on. Every rejection carries the numeric code that
//! ends up in the `{id, message}` error body.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use super::domain::{AddCostRequest, Category, NewCost, ReportQuery};
use crate::errors::{codes, ServiceError};

pub const MIN_YEAR: i32 = 1970;
pub const MAX_YEAR: i32 = 3000;

/// Validated `?id=&year=&month=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportKey {
    pub userid: i64,
    pub year: i32,
    pub month: u32,
}

/// Integral number or numeric string.
pub fn parse_userid(raw: &Value) -> Result<i64, ServiceError> {
    integral(raw).ok_or_else(|| ServiceError::validation(codes::USERID_INVALID, "userid must be a number"))
}

/// Check every field of an add-cost body, in code order (4001..4005).
/// The past-date rule needs the clock and is applied by the caller.
pub fn validate_new_cost(req: &AddCostRequest) -> Result<NewCost, ServiceError> {
    let userid = parse_userid(&req.userid)?;

    let description = match &req.description {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return Err(ServiceError::validation(codes::DESCRIPTION_REQUIRED, "description is required")),
    };

    let category = req.category.as_str().and_then(Category::parse).ok_or_else(|| {
        ServiceError::validation(
            codes::CATEGORY_INVALID,
            format!("category must be one of: {}", Category::joined()),
        )
    })?;

    let sum = finite(&req.sum).ok_or_else(|| ServiceError::validation(codes::SUM_INVALID, "sum must be a number"))?;

    let created_at = parse_timestamp(&req.created_at)
        .map_err(|_| ServiceError::validation(codes::CREATED_AT_INVALID, "created_at is invalid"))?;

    Ok(NewCost { userid, description, category, sum, created_at })
}

/// Year, then month, then id.
pub fn validate_report_query(q: &ReportQuery) -> Result<ReportKey, ServiceError> {
    let year = q
        .year
        .as_deref()
        .and_then(|s| s.trim().parse::<i32>().ok())
        .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
        .ok_or_else(|| ServiceError::validation(codes::YEAR_INVALID, "year is invalid"))?;

    let month = q
        .month
        .as_deref()
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| ServiceError::validation(codes::MONTH_INVALID, "month is invalid"))?;

    let userid = q
        .id
        .as_deref()
        .and_then(|s| integral(&Value::String(s.to_string())))
        .ok_or_else(|| ServiceError::validation(codes::USERID_INVALID, "userid must be a number"))?;

    Ok(ReportKey { userid, year, month })
}

/// Falsy values (`null`, `""`, `0`, `false`) mean "not supplied". Accepts
/// RFC3339, `YYYY-MM-DD`, naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC)
/// and epoch milliseconds.
pub fn parse_timestamp(raw: &Value) -> Result<Option<DateTime<Utc>>, String> {
    match raw {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(None),
        Value::String(s) => parse_timestamp_str(s.trim()).map(Some).ok_or_else(|| format!("unparseable timestamp: {s}")),
        Value::Number(n) => n
            .as_f64()
            .filter(|ms| ms.is_finite())
            .and_then(|ms| Utc.timestamp_millis_opt(ms.trunc() as i64).single())
            .map(Some)
            .ok_or_else(|| format!("epoch millis out of range: {n}")),
        other => Err(format!("unsupported timestamp type: {other}")),
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `[first day 00:00, first day of next month 00:00)` in UTC.
pub fn month_range(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), ServiceError> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single();
    let end = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single();
    match (start, end) {
        (Some(s), Some(e)) => Ok((s, e)),
        _ => Err(ServiceError::Internal(format!("invalid calendar month {year}-{month}"))),
    }
}

/// Strictly before the month containing `now`.
pub fn is_month_in_past(year: i32, month: u32, now: DateTime<Utc>) -> bool {
    year < now.year() || (year == now.year() && month < now.month())
}

fn number_like(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn finite(v: &Value) -> Option<f64> {
    number_like(v).filter(|f| f.is_finite())
}

fn integral(v: &Value) -> Option<i64> {
    if let Value::Number(n) = v {
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
    }
    finite(v)
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
        .map(|f| f as i64)
}
