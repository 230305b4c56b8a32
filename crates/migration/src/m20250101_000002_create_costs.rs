//! Create `costs` table: append-only expense lines.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Costs::Table)
                    .if_not_exists()
                    .col(big_integer(Costs::Id).primary_key().auto_increment())
                    .col(big_integer(Costs::Userid).not_null())
                    .col(text(Costs::Description).not_null())
                    .col(string_len(Costs::Category, 32).not_null())
                    .col(double(Costs::Sum).not_null())
                    .col(timestamp_with_time_zone(Costs::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Costs::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Costs { Table, Id, Userid, Description, Category, Sum, CreatedAt }
