use super::{parse_list, Lookup};

/// Origin allowed by default: the local frontend dev server.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the blueprints, parsed from
    /// `BUGBOUNTY_ALLOWED_ORIGINS` (comma-separated).
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
        }
    }
}

impl ServerConfig {
    pub fn from_lookup(lookup: Lookup<'_>, base: Self) -> Self {
        let allowed_origins = lookup("BUGBOUNTY_ALLOWED_ORIGINS")
            .map(|v| parse_list(&v))
            .filter(|origins| !origins.is_empty())
            .unwrap_or(base.allowed_origins);

        Self {
            host: lookup("BUGBOUNTY_API_HOST").unwrap_or(base.host),
            port: lookup("BUGBOUNTY_API_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(base.port),
            allowed_origins,
        }
    }
}
