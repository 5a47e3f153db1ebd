use crate::{
    config::ledger::LedgerConfig,
    error::{AppError, AppResult},
    models::{comment, Comment, CommentModel, LikeTarget, Question},
    services::like::{lock_timeout_sql, LikeService},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Answers to a question: the accepted one first, then highest voted.
    pub async fn list_by_question(&self, question_id: i32) -> AppResult<Vec<CommentModel>> {
        Question::find_by_id(question_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let comments = Comment::find()
            .filter(comment::Column::QuestionId.eq(question_id))
            .order_by_desc(comment::Column::IsAccepted)
            .order_by_desc(comment::Column::Votes)
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CommentModel> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        question_id: i32,
        user_id: i32,
        content: &str,
    ) -> AppResult<CommentModel> {
        Question::find_by_id(question_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();

        let new_comment = comment::ActiveModel {
            question_id: sea_orm::ActiveValue::Set(question_id),
            user_id: sea_orm::ActiveValue::Set(user_id),
            content: sea_orm::ActiveValue::Set(content.to_string()),
            votes: sea_orm::ActiveValue::Set(0),
            is_accepted: sea_orm::ActiveValue::Set(false),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let comment = new_comment.insert(&self.db).await?;
        Ok(comment)
    }

    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        is_admin: bool,
        content: &str,
    ) -> AppResult<CommentModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id && !is_admin {
            return Err(AppError::Forbidden);
        }

        let mut active: comment::ActiveModel = existing.into();
        active.content = sea_orm::ActiveValue::Set(content.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Mark or unmark an answer as accepted. Only the asker or an admin may.
    ///
    /// Marking clears any other accepted answer on the same question. The
    /// question row lock serializes concurrent accepts.
    pub async fn toggle_accepted(
        &self,
        id: i32,
        user_id: i32,
        is_admin: bool,
    ) -> AppResult<CommentModel> {
        let question_id = self.get_by_id(id).await?.question_id;

        let txn = self.db.begin().await?;
        txn.execute_unprepared(&lock_timeout_sql(LedgerConfig::global().lock_timeout_ms))
            .await?;

        let question = Question::find_by_id(question_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        if question.user_id != user_id && !is_admin {
            return Err(AppError::Forbidden);
        }

        // Re-read under the question lock; the answer may have gone meanwhile.
        let answer = Comment::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let accept = !answer.is_accepted;

        if accept {
            Comment::update_many()
                .col_expr(comment::Column::IsAccepted, Expr::value(false))
                .filter(comment::Column::QuestionId.eq(question_id))
                .filter(comment::Column::IsAccepted.eq(true))
                .exec(&txn)
                .await?;
        }

        let mut active: comment::ActiveModel = answer.into();
        active.is_accepted = sea_orm::ActiveValue::Set(accept);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        tracing::info!(
            "Answer {} on question {} {}",
            id,
            question_id,
            if accept { "accepted" } else { "unaccepted" }
        );
        Ok(updated)
    }

    pub async fn delete(&self, id: i32, user_id: i32, is_admin: bool) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id && !is_admin {
            return Err(AppError::Forbidden);
        }

        let txn = self.db.begin().await?;
        LikeService::lock_target(&txn, LikeTarget::Comment, id).await?;
        let purged = LikeService::purge_targets(&txn, LikeTarget::Comment, &[id]).await?;
        Comment::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!("Deleted comment {} with {} like marks", id, purged);
        Ok(())
    }
}
