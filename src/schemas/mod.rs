pub mod program;
pub mod user;

pub use program::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string with surrounding whitespace removed, so
/// length rules apply to the value that gets stored.
pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()))
}
