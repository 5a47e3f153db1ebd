use super::columns::{cascade_to, counter, created_now, foreign_id, id, owned_by_user};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Answers to questions. Votes are the comment's like counter.
#[derive(DeriveIden, Clone)]
enum Comments {
    Table,
    Id,
    QuestionId,
    UserId,
    Content,
    Votes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(Comments::Table)
            .if_not_exists()
            .col(id(Comments::Id))
            .col(foreign_id(Comments::QuestionId))
            .col(foreign_id(Comments::UserId))
            .col(ColumnDef::new(Comments::Content).text().not_null())
            .col(counter(Comments::Votes))
            .col(created_now(Comments::CreatedAt))
            .col(created_now(Comments::UpdatedAt))
            .foreign_key(&mut cascade_to(
                "fk_comments_question_id",
                (Comments::Table, Comments::QuestionId),
                (Questions::Table, Questions::Id),
            ))
            .foreign_key(&mut owned_by_user(
                "fk_comments_user_id",
                Comments::Table,
                Comments::UserId,
            ))
            .to_owned();
        manager.create_table(table).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_question_id")
                    .table(Comments::Table)
                    .col(Comments::QuestionId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await
    }
}
