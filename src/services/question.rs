use crate::{
    error::{AppError, AppResult},
    models::{comment, question, Comment, LikeTarget, Question, QuestionModel, User},
    services::{contains_term, like::LikeService},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};

pub struct QuestionService {
    db: DatabaseConnection,
}

impl QuestionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, page: u64, per_page: u64) -> AppResult<(Vec<QuestionModel>, u64)> {
        self.fetch_page(Question::find(), page, per_page).await
    }

    /// Questions whose title or description contains `term`, ignoring case.
    pub async fn search(
        &self,
        term: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<QuestionModel>, u64)> {
        let query = Question::find().filter(
            Condition::any()
                .add(contains_term(question::Column::Title, term))
                .add(contains_term(question::Column::Description, term)),
        );
        self.fetch_page(query, page, per_page).await
    }

    pub async fn list_by_user(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<QuestionModel>, u64)> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let query = Question::find().filter(question::Column::UserId.eq(user_id));
        self.fetch_page(query, page, per_page).await
    }

    async fn fetch_page(
        &self,
        query: Select<Question>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<QuestionModel>, u64)> {
        let paginator = query
            .order_by_desc(question::Column::CreatedAt)
            .order_by_desc(question::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let questions = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((questions, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<QuestionModel> {
        Question::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        user_id: i32,
        title: &str,
        description: &str,
    ) -> AppResult<QuestionModel> {
        let now = chrono::Utc::now().naive_utc();

        let new_question = question::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            title: sea_orm::ActiveValue::Set(title.to_string()),
            description: sea_orm::ActiveValue::Set(description.to_string()),
            votes: sea_orm::ActiveValue::Set(0),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let question = new_question.insert(&self.db).await?;
        Ok(question)
    }

    /// Title/description edit by the asker or an admin. Votes are untouched.
    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        is_admin: bool,
        title: &str,
        description: &str,
    ) -> AppResult<QuestionModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id && !is_admin {
            return Err(AppError::Forbidden);
        }

        let mut active: question::ActiveModel = existing.into();
        active.title = sea_orm::ActiveValue::Set(title.to_string());
        active.description = sea_orm::ActiveValue::Set(description.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32, user_id: i32, is_admin: bool) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id && !is_admin {
            return Err(AppError::Forbidden);
        }
        self.delete_cascade(id).await
    }

    /// Remove the question, its answers, and the like marks on all of them.
    ///
    /// Answer rows are locked before their marks are purged; the foreign key
    /// then removes the rows together with the question.
    pub async fn delete_cascade(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;

        LikeService::lock_target(&txn, LikeTarget::Question, id).await?;

        let comment_ids: Vec<i32> = Comment::find()
            .select_only()
            .column(comment::Column::Id)
            .filter(comment::Column::QuestionId.eq(id))
            .lock_exclusive()
            .into_tuple()
            .all(&txn)
            .await?;

        let purged_comments =
            LikeService::purge_targets(&txn, LikeTarget::Comment, &comment_ids).await?;
        let purged_question = LikeService::purge_targets(&txn, LikeTarget::Question, &[id]).await?;
        Question::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(
            "Deleted question {} with {} answers ({} like marks)",
            id,
            comment_ids.len(),
            purged_comments + purged_question
        );
        Ok(())
    }
}
