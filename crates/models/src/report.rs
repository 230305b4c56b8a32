use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::NotSet, Set};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Snapshot of a computed monthly report, unique per (userid, year, month).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub userid: i64,
    pub year: i32,
    pub month: i32,
    pub report_json: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn find_by_key<C: ConnectionTrait>(db: &C, userid: i64, year: i32, month: i32) -> Result<Option<Model>, ModelError> {
    let row = Entity::find()
        .filter(Column::Userid.eq(userid))
        .filter(Column::Year.eq(year))
        .filter(Column::Month.eq(month))
        .one(db)
        .await?;
    Ok(row)
}

/// Insert the snapshot, or replace document and timestamp of an existing one.
/// Runs as a single `INSERT .. ON CONFLICT DO UPDATE`, so concurrent writers
/// for the same key never hit a duplicate-key error.
pub async fn upsert<C: ConnectionTrait>(db: &C, userid: i64, year: i32, month: i32, report_json: Json) -> Result<(), ModelError> {
    if !(1..=12).contains(&month) { return Err(ModelError::Validation("month out of range".into())); }
    let am = ActiveModel {
        id: NotSet,
        userid: Set(userid),
        year: Set(year),
        month: Set(month),
        report_json: Set(report_json),
        created_at: Set(Utc::now().into()),
    };
    Entity::insert(am)
        .on_conflict(
            OnConflict::columns([Column::Userid, Column::Year, Column::Month])
                .update_columns([Column::ReportJson, Column::CreatedAt])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}
