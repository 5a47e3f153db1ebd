use super::columns::{created_now, id};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Bio,
    Role,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Users::Table)
            .if_not_exists()
            .col(id(Users::Id))
            .col(ColumnDef::new(Users::Username).string_len(50).not_null().unique_key())
            .col(ColumnDef::new(Users::Email).string_len(255).not_null().unique_key())
            .col(ColumnDef::new(Users::PasswordHash).string_len(255).not_null())
            .col(ColumnDef::new(Users::Bio).text().null())
            // user | admin | banned
            .col(ColumnDef::new(Users::Role).string_len(20).not_null().default("user"))
            .col(created_now(Users::CreatedAt))
            .col(created_now(Users::UpdatedAt))
            .to_owned();

        manager.create_table(table).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}
