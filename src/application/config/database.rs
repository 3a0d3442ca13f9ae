use std::fmt;
use std::str::FromStr;

use super::Lookup;

/// What the factory does to the schema before serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Drop every table and recreate the schema. Destroys all data.
    Reset,
    /// Apply pending migrations, keep existing data.
    Migrate,
    /// Fail if any migration is pending; applies nothing.
    Verify,
}

impl SchemaMode {
    pub fn is_destructive(self) -> bool {
        matches!(self, SchemaMode::Reset)
    }
}

impl FromStr for SchemaMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reset" => Ok(SchemaMode::Reset),
            "migrate" => Ok(SchemaMode::Migrate),
            "verify" => Ok(SchemaMode::Verify),
            other => Err(format!("unknown schema mode '{}'", other)),
        }
    }
}

impl fmt::Display for SchemaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaMode::Reset => "reset",
            SchemaMode::Migrate => "migrate",
            SchemaMode::Verify => "verify",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub schema_mode: SchemaMode,
}

impl DatabaseConfig {
    pub fn from_lookup(lookup: Lookup<'_>, base: Self) -> Self {
        Self {
            database_url: lookup("BUGBOUNTY_DATABASE_URL")
                .or_else(|| lookup("DATABASE_URL"))
                .unwrap_or(base.database_url),
            max_connections: lookup("BUGBOUNTY_DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.max_connections),
            schema_mode: lookup("BUGBOUNTY_SCHEMA_MODE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.schema_mode),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}
