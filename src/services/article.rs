use crate::{
    error::{AppError, AppResult},
    models::{article, Article, ArticleModel, LikeTarget, User},
    services::{contains_term, like::LikeService},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait,
};

pub struct ArticleService {
    db: DatabaseConnection,
}

impl ArticleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, page: u64, per_page: u64) -> AppResult<(Vec<ArticleModel>, u64)> {
        self.fetch_page(Article::find(), page, per_page).await
    }

    /// Articles whose title or content contains `term`, ignoring case.
    pub async fn search(
        &self,
        term: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ArticleModel>, u64)> {
        let query = Article::find().filter(
            Condition::any()
                .add(contains_term(article::Column::Title, term))
                .add(contains_term(article::Column::Content, term)),
        );
        self.fetch_page(query, page, per_page).await
    }

    pub async fn list_by_user(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ArticleModel>, u64)> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let query = Article::find().filter(article::Column::UserId.eq(user_id));
        self.fetch_page(query, page, per_page).await
    }

    /// Newest first.
    async fn fetch_page(
        &self,
        query: Select<Article>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ArticleModel>, u64)> {
        let paginator = query
            .order_by_desc(article::Column::CreatedAt)
            .order_by_desc(article::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let articles = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((articles, total))
    }

    /// Top articles by cached like count, newest first on ties.
    pub async fn most_liked(&self, limit: u64) -> AppResult<Vec<ArticleModel>> {
        let articles = Article::find()
            .order_by_desc(article::Column::Likes)
            .order_by_desc(article::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(articles)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<ArticleModel> {
        Article::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, user_id: i32, title: &str, content: &str) -> AppResult<ArticleModel> {
        let now = chrono::Utc::now().naive_utc();

        let new_article = article::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            title: sea_orm::ActiveValue::Set(title.to_string()),
            content: sea_orm::ActiveValue::Set(content.to_string()),
            likes: sea_orm::ActiveValue::Set(0),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let article = new_article.insert(&self.db).await?;
        Ok(article)
    }

    /// Title/content edit by the author or an admin. The like counter is
    /// left untouched.
    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        is_admin: bool,
        title: &str,
        content: &str,
    ) -> AppResult<ArticleModel> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id && !is_admin {
            return Err(AppError::Forbidden);
        }

        let mut active: article::ActiveModel = existing.into();
        active.title = sea_orm::ActiveValue::Set(title.to_string());
        active.content = sea_orm::ActiveValue::Set(content.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Delete as the author, or as an admin when `is_admin` is set.
    pub async fn delete(&self, id: i32, user_id: i32, is_admin: bool) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id && !is_admin {
            return Err(AppError::Forbidden);
        }
        self.delete_cascade(id).await
    }

    /// Remove the article and every like mark on it in one transaction.
    pub async fn delete_cascade(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;

        LikeService::lock_target(&txn, LikeTarget::Article, id).await?;
        let purged = LikeService::purge_targets(&txn, LikeTarget::Article, &[id]).await?;
        Article::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!("Deleted article {} with {} like marks", id, purged);
        Ok(())
    }
}
