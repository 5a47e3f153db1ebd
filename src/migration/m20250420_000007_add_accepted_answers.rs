use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "ALTER TABLE comments ADD COLUMN IF NOT EXISTS is_accepted BOOLEAN NOT NULL DEFAULT FALSE",
        )
        .await?;

        // At most one accepted answer per question.
        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_comments_one_accepted
             ON comments (question_id) WHERE is_accepted",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP INDEX IF EXISTS idx_comments_one_accepted")
            .await?;
        db.execute_unprepared("ALTER TABLE comments DROP COLUMN IF EXISTS is_accepted")
            .await?;

        Ok(())
    }
}
