use crate::application::database::DbConn;
use crate::application::extensions::Extensions;
use crate::services::PasswordHasher;

/// Handler state: the request-time view of one application's extensions
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub hasher: PasswordHasher,
}

impl AppState {
    pub fn new(db: DbConn, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    pub fn from_extensions(extensions: &Extensions) -> Self {
        Self::new(extensions.db.clone(), extensions.hasher)
    }
}
