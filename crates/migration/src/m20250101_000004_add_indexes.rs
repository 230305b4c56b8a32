//! Lookup indexes plus the unique report key the cache upsert relies on.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_costs_userid_created_at")
                    .table(Costs::Table)
                    .col(Costs::Userid)
                    .col(Costs::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // ON CONFLICT (userid, year, month) needs this exact unique index
        manager
            .create_index(
                Index::create()
                    .name("uq_reports_userid_year_month")
                    .table(Reports::Table)
                    .col(Reports::Userid)
                    .col(Reports::Year)
                    .col(Reports::Month)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uq_reports_userid_year_month").table(Reports::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_costs_userid_created_at").table(Costs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Costs { Table, Userid, CreatedAt }

#[derive(DeriveIden)]
enum Reports { Table, Userid, Year, Month }
