use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// One expense line. Rows are only ever inserted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "costs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub userid: i64,
    pub description: String,
    pub category: String,
    pub sum: f64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    userid: i64,
    description: &str,
    category: &str,
    sum: f64,
    created_at: DateTime<Utc>,
) -> Result<Model, ModelError> {
    if description.trim().is_empty() { return Err(ModelError::Validation("description required".into())); }
    if !sum.is_finite() { return Err(ModelError::Validation("sum must be finite".into())); }
    let am = ActiveModel {
        id: NotSet,
        userid: Set(userid),
        description: Set(description.to_string()),
        category: Set(category.to_string()),
        sum: Set(sum),
        created_at: Set(created_at.into()),
    };
    Ok(am.insert(db).await?)
}

/// Costs of `userid` with `start <= created_at < end`, oldest first.
pub async fn list_in_range<C: ConnectionTrait>(
    db: &C,
    userid: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Model>, ModelError> {
    let rows = Entity::find()
        .filter(Column::Userid.eq(userid))
        .filter(Column::CreatedAt.gte(start))
        .filter(Column::CreatedAt.lt(end))
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}
