use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use crate::config::{DatabaseConfig, SchemaMode};
use crate::error::{AppError, Result};
use crate::migrations::Migrator;

pub type DbConn = DatabaseConnection;

/// Open a pooled connection for the configured database.
///
/// Does not touch the schema; see [`SchemaMigrator`].
pub async fn connect(config: &DatabaseConfig) -> Result<DbConn> {
    tracing::info!("Connecting to database...");

    let db = Database::connect(connect_options(config))
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))?;

    tracing::info!("Database connection established");
    Ok(db)
}

/// Upper bound for a connection that must never be recycled
const KEEP_FOREVER: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut opts = ConnectOptions::new(config.database_url.clone());
    opts.connect_timeout(Duration::from_secs(30))
        .sqlx_logging(false);

    // `:memory:` lives as long as its one connection: a second or recycled
    // connection would see an empty database.
    if config.is_in_memory() {
        opts.max_connections(1)
            .min_connections(1)
            .max_lifetime(KEEP_FOREVER)
            .idle_timeout(KEEP_FOREVER);
    } else {
        opts.max_connections(config.max_connections.max(1))
            .min_connections(1)
            .idle_timeout(Duration::from_secs(600));
    }

    opts
}

/// Schema management bound to one database handle
#[derive(Debug, Clone)]
pub struct SchemaMigrator {
    db: DbConn,
}

impl SchemaMigrator {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Bring the schema into the state `mode` asks for
    pub async fn prepare(&self, mode: SchemaMode) -> Result<()> {
        match mode {
            SchemaMode::Reset => self.reset().await,
            SchemaMode::Migrate => self.upgrade().await,
            SchemaMode::Verify => self.verify().await,
        }
    }

    /// Drop every table and recreate the schema from the migrations
    pub async fn reset(&self) -> Result<()> {
        tracing::warn!("Dropping all tables and recreating the schema");
        Migrator::fresh(&self.db)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reset schema: {}", e)))?;
        tracing::info!("Database schema recreated");
        Ok(())
    }

    /// Apply pending migrations
    pub async fn upgrade(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        Migrator::up(&self.db, None)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;
        tracing::info!("Database migrations completed");
        Ok(())
    }

    /// Fail when the schema is behind the migrations
    pub async fn verify(&self) -> Result<()> {
        let pending = self.pending_migrations().await?;
        if !pending.is_empty() {
            return Err(AppError::Config(format!(
                "database schema is out of date, pending migrations: {}",
                pending.join(", ")
            )));
        }
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    /// Names of migrations not yet applied
    pub async fn pending_migrations(&self) -> Result<Vec<String>> {
        let pending = Migrator::get_pending_migrations(&self.db).await?;
        Ok(pending.iter().map(|m| m.name().to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::prelude::*;
    use crate::error::is_unique_violation;
    use crate::models::user;
    use crate::test_helpers::{insert_program, insert_user, table_names};
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, Set, Statement};

    async fn memory_db() -> DbConn {
        connect(&Config::testing().database).await.unwrap()
    }

    #[tokio::test]
    async fn test_reset_creates_all_tables() {
        let migrator = SchemaMigrator::new(memory_db().await);
        migrator.prepare(SchemaMode::Reset).await.unwrap();

        let tables = table_names(&migrator.db).await;
        assert_eq!(tables, vec!["programs", "users"]);
    }

    #[tokio::test]
    async fn test_reset_discards_existing_rows() {
        let migrator = SchemaMigrator::new(memory_db().await);
        migrator.reset().await.unwrap();

        let owner = insert_user(&migrator.db, "alice").await;
        insert_program(&migrator.db, "Acme", owner.id).await;
        assert_eq!(Program::find().count(&migrator.db).await.unwrap(), 1);

        migrator.reset().await.unwrap();
        assert_eq!(User::find().count(&migrator.db).await.unwrap(), 0);
        assert_eq!(Program::find().count(&migrator.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_verify_fails_on_empty_database() {
        let migrator = SchemaMigrator::new(memory_db().await);

        let err = migrator.prepare(SchemaMode::Verify).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("pending migrations"));
    }

    #[tokio::test]
    async fn test_verify_passes_after_migrate() {
        let migrator = SchemaMigrator::new(memory_db().await);
        migrator.prepare(SchemaMode::Migrate).await.unwrap();

        assert!(migrator.pending_migrations().await.unwrap().is_empty());
        migrator.prepare(SchemaMode::Verify).await.unwrap();
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let migrator = SchemaMigrator::new(memory_db().await);
        migrator.upgrade().await.unwrap();
        migrator.upgrade().await.unwrap();

        assert_eq!(table_names(&migrator.db).await.len(), 2);
    }

    #[test]
    fn test_memory_pool_never_recycles_its_connection() {
        let opts = connect_options(&Config::testing().database);

        assert_eq!(opts.get_max_connections(), Some(1));
        assert_eq!(opts.get_min_connections(), Some(1));
        assert_eq!(opts.get_max_lifetime(), Some(KEEP_FOREVER));
        assert_eq!(opts.get_idle_timeout(), Some(KEEP_FOREVER));
    }

    #[test]
    fn test_file_pool_recycles_idle_connections() {
        let config = DatabaseConfig {
            database_url: "sqlite:///tmp/bugbounty.db?mode=rwc".to_string(),
            max_connections: 5,
            schema_mode: SchemaMode::Migrate,
        };
        let opts = connect_options(&config);

        assert_eq!(opts.get_max_connections(), Some(5));
        assert_eq!(opts.get_idle_timeout(), Some(Duration::from_secs(600)));
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let migrator = SchemaMigrator::new(memory_db().await);
        migrator.reset().await.unwrap();
        insert_user(&migrator.db, "alice").await;

        let now = Utc::now();
        let err = user::ActiveModel {
            username: Set("alice".to_string()),
            email: Set("other@example.com".to_string()),
            hashed_password: Set("not-a-real-hash".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&migrator.db)
        .await
        .unwrap_err();

        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_username_uniqueness_comes_from_column_constraint_only() {
        let migrator = SchemaMigrator::new(memory_db().await);
        migrator.reset().await.unwrap();

        let rows = migrator
            .db
            .query_all(Statement::from_string(
                migrator.db.get_database_backend(),
                "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'users'"
                    .to_string(),
            ))
            .await
            .unwrap();
        let names: Vec<String> = rows
            .iter()
            .map(|row| row.try_get::<String>("", "name").unwrap())
            .collect();

        assert!(!names.iter().any(|n| n == "idx_users_username"), "{:?}", names);
    }

    #[tokio::test]
    async fn test_connect_rejects_unreachable_url() {
        let config = DatabaseConfig {
            database_url: "not-a-scheme://nowhere".to_string(),
            max_connections: 1,
            schema_mode: SchemaMode::Migrate,
        };

        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
