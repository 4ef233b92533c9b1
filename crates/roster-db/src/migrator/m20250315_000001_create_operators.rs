//! Migration adding portal operator accounts

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Operators::Table)
                    .if_not_exists()
                    .col(uuid(Operators::Id).primary_key())
                    .col(string_len(Operators::Username, 255).not_null().unique_key())
                    .col(string_len(Operators::PasswordHash, 255).not_null())
                    .col(string_len(Operators::FullName, 255).not_null())
                    .col(string_len_null(Operators::Email, 255))
                    .col(boolean(Operators::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(Operators::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(Operators::LastLoginAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_operators_username")
                    .table(Operators::Table)
                    .col(Operators::Username)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_operators_username")
                    .table(Operators::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Operators::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Operators {
    Table,
    Id,
    Username,
    PasswordHash,
    FullName,
    Email,
    IsActive,
    CreatedAt,
    LastLoginAt,
}
