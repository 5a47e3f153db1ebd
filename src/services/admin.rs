use crate::{
    config::ledger::LedgerConfig,
    error::{AppError, AppResult},
    models::{
        article, comment, like, question, user, Article, Comment, Like, LikeTarget, Question,
        User, UserModel,
    },
    services::like::{lock_timeout_sql, LikeService},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::BTreeSet;
use utoipa::ToSchema;

const VALID_ROLES: [&str; 3] = ["user", "admin", "banned"];

pub struct AdminService {
    db: DatabaseConnection,
}

/// Platform-wide row counts. `users_today` counts registrations since UTC midnight.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_articles: u64,
    pub total_questions: u64,
    pub total_comments: u64,
    pub total_likes: u64,
    pub users_today: u64,
}

impl AdminService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_stats(&self) -> AppResult<AdminStats> {
        let total_users = User::find().count(&self.db).await?;
        let total_articles = Article::find().count(&self.db).await?;
        let total_questions = Question::find().count(&self.db).await?;
        let total_comments = Comment::find().count(&self.db).await?;
        let total_likes = Like::find().count(&self.db).await?;

        let today_start = chrono::Utc::now()
            .naive_utc()
            .date()
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid start of day")))?;

        let users_today = User::find()
            .filter(user::Column::CreatedAt.gte(today_start))
            .count(&self.db)
            .await?;

        Ok(AdminStats {
            total_users,
            total_articles,
            total_questions,
            total_comments,
            total_likes,
            users_today,
        })
    }

    pub async fn list_users(&self, page: u64, per_page: u64) -> AppResult<(Vec<UserModel>, u64)> {
        let paginator = User::find()
            .order_by_desc(user::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((users, total))
    }

    pub async fn update_user_role(&self, user_id: i32, role: &str) -> AppResult<UserModel> {
        if !VALID_ROLES.contains(&role) {
            return Err(AppError::Validation(format!(
                "Invalid role. Must be one of: {}",
                VALID_ROLES.join(", ")
            )));
        }

        let existing = User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: user::ActiveModel = existing.into();
        active.role = sea_orm::ActiveValue::Set(role.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());
        let updated = active.update(&self.db).await?;

        tracing::info!("User {} role set to {}", user_id, role);
        Ok(updated)
    }

    /// Delete a user with everything they own, keeping the like ledger exact.
    ///
    /// Marks on the user's articles, questions and answers (including answers
    /// other people left on the user's questions) are purged, and targets the
    /// user had liked get their counters recounted without the user's marks.
    /// Everything happens in one transaction. Admins cannot delete themselves.
    pub async fn delete_user(&self, user_id: i32, acting_admin_id: i32) -> AppResult<()> {
        if user_id == acting_admin_id {
            return Err(AppError::Forbidden);
        }

        let txn = self.db.begin().await?;
        txn.execute_unprepared(&lock_timeout_sql(LedgerConfig::global().lock_timeout_ms))
            .await?;

        // Inserting content or marks for this user needs a key-share lock on
        // the row, so nothing new can appear past this point.
        User::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;

        // Same kind order as every other multi-row ledger lock.
        let mut plan = Vec::with_capacity(LikeTarget::ALL.len());
        let mut owned_questions = Vec::new();
        for target in LikeTarget::ALL {
            let owned = owned_ids(&txn, target, user_id, &owned_questions).await?;
            let liked: Vec<i32> = Like::find()
                .select_only()
                .column(like::Column::TargetId)
                .filter(like::Column::UserId.eq(user_id))
                .filter(like::Column::TargetType.eq(target))
                .into_tuple()
                .all(&txn)
                .await?;

            let to_lock: Vec<i32> = owned
                .iter()
                .chain(liked.iter())
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            LikeService::lock_targets(&txn, target, &to_lock).await?;

            if target == LikeTarget::Question {
                owned_questions = owned.iter().copied().collect();
            }
            let recount: Vec<i32> = liked.into_iter().filter(|id| !owned.contains(id)).collect();
            plan.push((target, owned, recount));
        }

        let own_marks = Like::delete_many()
            .filter(like::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?
            .rows_affected;

        let mut purged = 0;
        let mut recounted = 0;
        for (target, owned, recount) in &plan {
            let owned: Vec<i32> = owned.iter().copied().collect();
            purged += LikeService::purge_targets(&txn, *target, &owned).await?;
            recounted += LikeService::recount_targets(&txn, *target, recount).await?;
        }

        User::delete_by_id(user_id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            "Deleted user {}: {} own marks removed, {} marks purged from owned content, {} counters recounted",
            user_id,
            own_marks,
            purged,
            recounted
        );
        Ok(())
    }
}

/// Ids of `target` rows that disappear with the user. Answers count when the
/// user wrote them or when they sit under one of `owned_questions`.
async fn owned_ids(
    txn: &DatabaseTransaction,
    target: LikeTarget,
    user_id: i32,
    owned_questions: &[i32],
) -> AppResult<BTreeSet<i32>> {
    let ids: Vec<i32> = match target {
        LikeTarget::Article => {
            Article::find()
                .select_only()
                .column(article::Column::Id)
                .filter(article::Column::UserId.eq(user_id))
                .into_tuple()
                .all(txn)
                .await?
        }
        LikeTarget::Question => {
            Question::find()
                .select_only()
                .column(question::Column::Id)
                .filter(question::Column::UserId.eq(user_id))
                .into_tuple()
                .all(txn)
                .await?
        }
        LikeTarget::Comment => {
            let mut owner = Condition::any().add(comment::Column::UserId.eq(user_id));
            if !owned_questions.is_empty() {
                owner = owner.add(comment::Column::QuestionId.is_in(owned_questions.to_vec()));
            }
            Comment::find()
                .select_only()
                .column(comment::Column::Id)
                .filter(owner)
                .into_tuple()
                .all(txn)
                .await?
        }
    };
    Ok(ids.into_iter().collect())
}
