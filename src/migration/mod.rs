use sea_orm_migration::prelude::*;

mod columns;
mod m20250420_000001_create_users_table;
mod m20250420_000002_create_articles_table;
mod m20250420_000003_create_questions_table;
mod m20250420_000004_create_comments_table;
mod m20250420_000005_create_likes_table;
mod m20250420_000006_add_counter_indexes;
mod m20250420_000007_add_accepted_answers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250420_000001_create_users_table::Migration),
            Box::new(m20250420_000002_create_articles_table::Migration),
            Box::new(m20250420_000003_create_questions_table::Migration),
            Box::new(m20250420_000004_create_comments_table::Migration),
            Box::new(m20250420_000005_create_likes_table::Migration),
            Box::new(m20250420_000006_add_counter_indexes::Migration),
            Box::new(m20250420_000007_add_accepted_answers::Migration),
        ]
    }
}
