use sea_orm_migration::prelude::*;

mod m20201001_000001_create_topic_table;
mod m20201001_000002_create_message_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20201001_000001_create_topic_table::Migration),
            Box::new(m20201001_000002_create_message_table::Migration),
        ]
    }
}
