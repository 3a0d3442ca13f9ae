//! Per-application extensions
//!
//! Everything an application instance binds at creation time. Two
//! applications created in one process never share any of these.

use crate::application::blueprint::CorsPolicy;
use crate::application::database::{self, DbConn, SchemaMigrator};
use crate::config::Config;
use crate::error::Result;
use crate::services::PasswordHasher;

#[derive(Debug, Clone)]
pub struct Extensions {
    pub db: DbConn,
    pub hasher: PasswordHasher,
    pub migrator: SchemaMigrator,
    pub cors: CorsPolicy,
}

impl Extensions {
    /// Bind the database, hasher, migration runner and CORS policy.
    ///
    /// Cheap settings are validated before a connection is opened.
    pub async fn bind(config: &Config) -> Result<Self> {
        let cors = CorsPolicy::new(config.server.allowed_origins.as_slice())?;
        let hasher = PasswordHasher::new(config.bcrypt_log_rounds)?;

        let db = database::connect(&config.database).await?;
        let migrator = SchemaMigrator::new(db.clone());

        tracing::debug!(
            bcrypt_cost = hasher.cost(),
            origins = ?cors.origins(),
            "Extensions bound"
        );

        Ok(Self {
            db,
            hasher,
            migrator,
            cors,
        })
    }
}
