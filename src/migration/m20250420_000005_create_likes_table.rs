use super::columns::{created_now, foreign_id, id, owned_by_user};
use sea_orm_migration::prelude::*;

/// Stored `LikeTarget` discriminants.
const TARGET_TYPES: [&str; 3] = ["article", "question", "comment"];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Likes {
    Table,
    Id,
    UserId,
    TargetType,
    TargetId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Likes::Table)
            .if_not_exists()
            .col(id(Likes::Id))
            .col(foreign_id(Likes::UserId))
            .col(
                ColumnDef::new(Likes::TargetType)
                    .string_len(20)
                    .not_null()
                    .check(Expr::col(Likes::TargetType).is_in(TARGET_TYPES)),
            )
            .col(foreign_id(Likes::TargetId))
            .col(created_now(Likes::CreatedAt))
            .foreign_key(&mut owned_by_user("fk_likes_user_id", Likes::Table, Likes::UserId))
            .to_owned();
        manager.create_table(table).await?;

        // One mark per (user, target); the ledger relies on this for ON CONFLICT.
        manager
            .create_index(
                Index::create()
                    .name("idx_likes_unique")
                    .table(Likes::Table)
                    .col(Likes::UserId)
                    .col(Likes::TargetType)
                    .col(Likes::TargetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_likes_target")
                    .table(Likes::Table)
                    .col(Likes::TargetType)
                    .col(Likes::TargetId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Likes::Table).to_owned())
            .await
    }
}
