use crate::error::AppError;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// Discriminator of the polymorphic `likes.target_id` reference.
///
/// Each variant owns exactly one table and one cached counter column; the
/// mapping is resolved by `table()` / `counter_column()` and nowhere else.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum LikeTarget {
    #[sea_orm(string_value = "article")]
    Article,
    #[sea_orm(string_value = "question")]
    Question,
    #[sea_orm(string_value = "comment")]
    Comment,
}

impl LikeTarget {
    pub const ALL: [LikeTarget; 3] = [
        LikeTarget::Article,
        LikeTarget::Question,
        LikeTarget::Comment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LikeTarget::Article => "article",
            LikeTarget::Question => "question",
            LikeTarget::Comment => "comment",
        }
    }

    /// Table holding the likeable rows.
    pub fn table(self) -> &'static str {
        match self {
            LikeTarget::Article => "articles",
            LikeTarget::Question => "questions",
            LikeTarget::Comment => "comments",
        }
    }

    /// Denormalized counter column on `table()`.
    pub fn counter_column(self) -> &'static str {
        match self {
            LikeTarget::Article => "likes",
            LikeTarget::Question | LikeTarget::Comment => "votes",
        }
    }
}

impl fmt::Display for LikeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LikeTarget {
    type Err = AppError;

    /// Accepts the plural route form (`articles`) as well as the singular one.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "article" | "articles" => Ok(LikeTarget::Article),
            "question" | "questions" => Ok(LikeTarget::Question),
            "comment" | "comments" => Ok(LikeTarget::Comment),
            _ => Err(AppError::InvalidTarget(raw.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "likes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub target_type: LikeTarget,
    pub target_id: i32,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
