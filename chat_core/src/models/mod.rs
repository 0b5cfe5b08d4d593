use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::ChatConfig;

pub mod migrator;

pub async fn open_or_create_db(config: &ChatConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(config.log_statements);

    // every pooled connection to `sqlite::memory:` would get its own database
    if config.database_url.contains(":memory:") {
        options.max_connections(1);
    }

    info!(url = %config.database_url, "connecting to database");
    Database::connect(options).await
}

pub async fn migrate_up(db: &DatabaseConnection) -> Result<(), DbErr> {
    migrator::Migrator::up(db, None).await?;
    info!("database migrations applied");
    Ok(())
}
