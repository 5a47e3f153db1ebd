use super::columns::{counter, created_now, foreign_id, id, owned_by_user};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden, Clone)]
enum Articles {
    Table,
    Id,
    UserId,
    Title,
    Content,
    Likes,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Articles::Table)
            .if_not_exists()
            .col(id(Articles::Id))
            .col(foreign_id(Articles::UserId))
            .col(ColumnDef::new(Articles::Title).string_len(200).not_null())
            .col(ColumnDef::new(Articles::Content).text().not_null())
            .col(counter(Articles::Likes))
            .col(created_now(Articles::CreatedAt))
            .col(created_now(Articles::UpdatedAt))
            .foreign_key(&mut owned_by_user(
                "fk_articles_user_id",
                Articles::Table,
                Articles::UserId,
            ))
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_articles_user_id")
                    .table(Articles::Table)
                    .col(Articles::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Articles::Table).to_owned())
            .await
    }
}
