//! Create `reports` table holding past-month report snapshots.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(big_integer(Reports::Id).primary_key().auto_increment())
                    .col(big_integer(Reports::Userid).not_null())
                    .col(integer(Reports::Year).not_null())
                    .col(integer(Reports::Month).not_null())
                    .col(json_binary(Reports::ReportJson).not_null())
                    .col(timestamp_with_time_zone(Reports::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Reports::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Reports { Table, Id, Userid, Year, Month, ReportJson, CreatedAt }
