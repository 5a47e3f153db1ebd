//! Column and key shapes shared by the table migrations.

use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
}

pub fn id(col: impl IntoIden + 'static) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

pub fn foreign_id(col: impl IntoIden + 'static) -> ColumnDef {
    ColumnDef::new(col).integer().not_null().to_owned()
}

/// Cached like/vote count. Never negative.
pub fn counter<C: IntoIden + Clone + 'static>(col: C) -> ColumnDef {
    ColumnDef::new(col.clone())
        .integer()
        .not_null()
        .default(0)
        .check(Expr::col(col).gte(0))
        .to_owned()
}

pub fn created_now(col: impl IntoIden + 'static) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

/// `ON DELETE CASCADE` reference from `table.col` to `parent.parent_col`.
pub fn cascade_to(
    name: &str,
    (table, col): (impl IntoIden + 'static, impl IntoIden + 'static),
    (parent, parent_col): (impl IntoIden + 'static, impl IntoIden + 'static),
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, col)
        .to(parent, parent_col)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

/// Rows owned by a user disappear with that user.
pub fn owned_by_user(
    name: &str,
    table: impl IntoIden + 'static,
    col: impl IntoIden + 'static,
) -> ForeignKeyCreateStatement {
    cascade_to(name, (table, col), (Users::Table, Users::Id))
}
