use crate::{
    config::ledger::LedgerConfig,
    error::{AppError, AppResult},
    models::{like, Like, LikeTarget},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Statement, TransactionTrait,
};
use std::collections::HashSet;

/// The like/vote ledger.
///
/// Owns the `likes` mark table and the cached counter columns of every
/// likeable table. No other service writes those counters.
pub struct LikeService {
    db: DatabaseConnection,
    config: LedgerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggle {
    pub liked: bool,
    pub count: i64,
}

/// Rows whose counter disagreed with the mark set and was rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterRebuild {
    pub articles: u64,
    pub questions: u64,
    pub comments: u64,
}

impl CounterRebuild {
    fn record(&mut self, target: LikeTarget, rows: u64) {
        match target {
            LikeTarget::Article => self.articles = rows,
            LikeTarget::Question => self.questions = rows,
            LikeTarget::Comment => self.comments = rows,
        }
    }

    pub fn total(&self) -> u64 {
        self.articles + self.questions + self.comments
    }
}

impl LikeService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, LedgerConfig::global())
    }

    pub fn with_config(db: DatabaseConnection, config: LedgerConfig) -> Self {
        Self { db, config }
    }

    /// Flip the caller's mark on a target and rewrite the target's counter.
    ///
    /// Lock, mark mutation, recount and counter write share one transaction;
    /// the row lock on the target serializes concurrent togglers of the same
    /// target. Any error drops the transaction, which rolls everything back.
    pub async fn toggle(
        &self,
        target: LikeTarget,
        target_id: i32,
        user_id: Option<i32>,
    ) -> AppResult<LikeToggle> {
        let user_id = user_id.ok_or(AppError::Unauthorized)?;

        let txn = self.db.begin().await?;
        txn.execute_unprepared(&lock_timeout_sql(self.config.lock_timeout_ms))
            .await?;

        Self::lock_target(&txn, target, target_id).await?;

        // Deleting is the lookup: a removed row means the mark existed.
        let removed = Like::delete_many()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TargetType.eq(target))
            .filter(like::Column::TargetId.eq(target_id))
            .exec(&txn)
            .await?
            .rows_affected;

        let liked = if removed > 0 {
            false
        } else {
            txn.execute(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                "INSERT INTO likes (user_id, target_type, target_id, created_at)
                 VALUES ($1, $2, $3, NOW())
                 ON CONFLICT (user_id, target_type, target_id) DO NOTHING",
                vec![user_id.into(), target.as_str().into(), target_id.into()],
            ))
            .await?;
            true
        };

        let count = Self::write_counter(&txn, target, target_id).await?;
        txn.commit().await?;

        tracing::debug!(
            user_id,
            target = %target,
            target_id,
            liked,
            count,
            "like toggled"
        );

        Ok(LikeToggle { liked, count })
    }

    /// Whether the user currently has a mark on the target.
    /// Anonymous callers and missing targets both read as `false`.
    pub async fn has_liked(
        &self,
        target: LikeTarget,
        target_id: i32,
        user_id: Option<i32>,
    ) -> AppResult<bool> {
        let Some(user_id) = user_id else {
            return Ok(false);
        };

        let sql = format!(
            "SELECT EXISTS (
                 SELECT 1 FROM likes l
                 JOIN {table} t ON t.id = l.target_id
                 WHERE l.user_id = $1 AND l.target_type = $2 AND l.target_id = $3
             )",
            table = target.table()
        );

        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                vec![user_id.into(), target.as_str().into(), target_id.into()],
            ))
            .await?;

        match row {
            Some(row) => Ok(row.try_get_by_index::<bool>(0)?),
            None => Ok(false),
        }
    }

    /// Number of marks on the target, `0` when the target does not exist.
    pub async fn count(&self, target: LikeTarget, target_id: i32) -> AppResult<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM likes l
             JOIN {table} t ON t.id = l.target_id
             WHERE l.target_type = $1 AND l.target_id = $2",
            table = target.table()
        );

        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                vec![target.as_str().into(), target_id.into()],
            ))
            .await?;

        match row {
            Some(row) => Ok(row.try_get_by_index::<i64>(0)?),
            None => Ok(0),
        }
    }

    /// Subset of `target_ids` the user has marked. Used by list read paths to
    /// fill `has_liked` with one query per page.
    pub async fn liked_ids(
        &self,
        target: LikeTarget,
        target_ids: &[i32],
        user_id: Option<i32>,
    ) -> AppResult<HashSet<i32>> {
        let Some(user_id) = user_id else {
            return Ok(HashSet::new());
        };
        if target_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = Like::find()
            .select_only()
            .column(like::Column::TargetId)
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TargetType.eq(target))
            .filter(like::Column::TargetId.is_in(target_ids.to_vec()))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(ids.into_iter().collect())
    }

    /// Recompute every counter from the mark set.
    ///
    /// Each likeable table is locked in EXCLUSIVE mode for the duration, so
    /// in-flight toggles finish first and new ones wait for the rebuild.
    pub async fn rebuild_counters(&self) -> AppResult<CounterRebuild> {
        let txn = self.db.begin().await?;
        txn.execute_unprepared(&lock_timeout_sql(self.config.lock_timeout_ms))
            .await?;

        let mut report = CounterRebuild::default();
        for target in LikeTarget::ALL {
            txn.execute_unprepared(&format!(
                "LOCK TABLE {} IN EXCLUSIVE MODE",
                target.table()
            ))
            .await?;

            let sql = format!(
                "UPDATE {table} AS t
                 SET {counter} = c.cnt
                 FROM (
                     SELECT e.id, COUNT(l.id)::int AS cnt
                     FROM {table} e
                     LEFT JOIN likes l ON l.target_type = $1 AND l.target_id = e.id
                     GROUP BY e.id
                 ) AS c
                 WHERE c.id = t.id AND t.{counter} <> c.cnt",
                table = target.table(),
                counter = target.counter_column()
            );

            let result = txn
                .execute(Statement::from_sql_and_values(
                    DatabaseBackend::Postgres,
                    &sql,
                    vec![target.as_str().into()],
                ))
                .await?;
            report.record(target, result.rows_affected());
        }

        txn.commit().await?;

        if report.total() > 0 {
            tracing::warn!(
                "Rebuilt drifted like counters: articles={}, questions={}, comments={}",
                report.articles,
                report.questions,
                report.comments
            );
        } else {
            tracing::info!("Like counters verified, no drift found");
        }

        Ok(report)
    }

    /// Take the row lock on a likeable row. `NotFound` if it does not exist.
    ///
    /// Deleting services call this before `purge_targets` so that no toggle
    /// can slip a mark in between the purge and the row delete.
    pub async fn lock_target<C: ConnectionTrait>(
        conn: &C,
        target: LikeTarget,
        target_id: i32,
    ) -> AppResult<()> {
        let sql = format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", target.table());
        conn.query_one(Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            &sql,
            vec![target_id.into()],
        ))
        .await?
        .ok_or(AppError::NotFound)?;
        Ok(())
    }

    /// Delete every mark on the given targets. Must run inside the same
    /// transaction that deletes the targets themselves.
    pub async fn purge_targets<C: ConnectionTrait>(
        conn: &C,
        target: LikeTarget,
        target_ids: &[i32],
    ) -> AppResult<u64> {
        if target_ids.is_empty() {
            return Ok(0);
        }

        let removed = Like::delete_many()
            .filter(like::Column::TargetType.eq(target))
            .filter(like::Column::TargetId.is_in(target_ids.to_vec()))
            .exec(conn)
            .await?
            .rows_affected;

        if removed > 0 {
            tracing::debug!("Purged {} {} like marks", removed, target);
        }
        Ok(removed)
    }

    /// Row-lock a set of likeable rows in id order. Returns the ids that exist.
    ///
    /// Callers locking several kinds go articles, questions, comments, the
    /// order `rebuild_counters` uses.
    pub async fn lock_targets<C: ConnectionTrait>(
        conn: &C,
        target: LikeTarget,
        target_ids: &[i32],
    ) -> AppResult<Vec<i32>> {
        if target_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id FROM {} WHERE id IN ({}) ORDER BY id FOR UPDATE",
            target.table(),
            placeholders(1, target_ids.len())
        );
        let rows = conn
            .query_all(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                target_ids.iter().map(|id| (*id).into()),
            ))
            .await?;

        rows.iter()
            .map(|row| row.try_get_by_index::<i32>(0).map_err(AppError::from))
            .collect()
    }

    /// Set each target's counter to its current mark count. The rows should
    /// already be locked by the caller's transaction.
    pub async fn recount_targets<C: ConnectionTrait>(
        conn: &C,
        target: LikeTarget,
        target_ids: &[i32],
    ) -> AppResult<u64> {
        if target_ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE {table} AS t
             SET {counter} = (
                 SELECT COUNT(*) FROM likes l
                 WHERE l.target_type = $1 AND l.target_id = t.id
             )
             WHERE t.id IN ({ids})",
            table = target.table(),
            counter = target.counter_column(),
            ids = placeholders(2, target_ids.len())
        );

        let mut values: Vec<sea_orm::Value> = vec![target.as_str().into()];
        values.extend(target_ids.iter().map(|id| (*id).into()));

        let result = conn
            .execute(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                values,
            ))
            .await?;
        Ok(result.rows_affected())
    }

    async fn write_counter<C: ConnectionTrait>(
        conn: &C,
        target: LikeTarget,
        target_id: i32,
    ) -> AppResult<i64> {
        let sql = format!(
            "UPDATE {table}
             SET {counter} = (
                 SELECT COUNT(*) FROM likes
                 WHERE target_type = $1 AND target_id = $2
             )
             WHERE id = $2
             RETURNING {counter}",
            table = target.table(),
            counter = target.counter_column()
        );

        let row = conn
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Postgres,
                &sql,
                vec![target.as_str().into(), target_id.into()],
            ))
            .await?
            .ok_or(AppError::NotFound)?;

        let count: i32 = row.try_get_by_index(0)?;
        Ok(i64::from(count))
    }
}

/// `$first, $first+1, ...` for `count` bind parameters.
fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|n| format!("${n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn lock_timeout_sql(lock_timeout_ms: u64) -> String {
    format!("SET LOCAL lock_timeout = '{lock_timeout_ms}ms'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_timeout_statement() {
        assert_eq!(lock_timeout_sql(250), "SET LOCAL lock_timeout = '250ms'");
    }

    #[test]
    fn placeholder_lists() {
        assert_eq!(placeholders(1, 3), "$1, $2, $3");
        assert_eq!(placeholders(2, 1), "$2");
        assert_eq!(placeholders(1, 0), "");
    }

    #[test]
    fn rebuild_report_records_per_kind() {
        let mut report = CounterRebuild::default();
        report.record(LikeTarget::Article, 2);
        report.record(LikeTarget::Comment, 1);
        assert_eq!(report.articles, 2);
        assert_eq!(report.questions, 0);
        assert_eq!(report.comments, 1);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn empty_rebuild_has_no_drift() {
        assert_eq!(CounterRebuild::default().total(), 0);
    }
}
