use super::columns::{counter, created_now, foreign_id, id, owned_by_user};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden, Clone)]
enum Questions {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Votes,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Questions::Table)
            .if_not_exists()
            .col(id(Questions::Id))
            .col(foreign_id(Questions::UserId))
            .col(ColumnDef::new(Questions::Title).string_len(200).not_null())
            .col(ColumnDef::new(Questions::Description).text().not_null())
            .col(counter(Questions::Votes))
            .col(created_now(Questions::CreatedAt))
            .col(created_now(Questions::UpdatedAt))
            .foreign_key(&mut owned_by_user(
                "fk_questions_user_id",
                Questions::Table,
                Questions::UserId,
            ))
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_questions_user_id")
                    .table(Questions::Table)
                    .col(Questions::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await
    }
}
