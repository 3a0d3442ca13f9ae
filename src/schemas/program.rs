use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::trimmed;
use crate::error::DomainError;
use crate::models::program;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProgram {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 128, message = "Length must be between 1 and 128.")
    )]
    #[schema(value_type = String, min_length = 1, max_length = 128)]
    pub name: Option<String>,

    #[validate(length(max = 4096, message = "Longer than maximum length 4096."))]
    pub description: Option<String>,

    #[validate(
        required(message = "Missing data for required field."),
        range(min = 0, message = "Must be greater than or equal to 0.")
    )]
    #[schema(value_type = i32, minimum = 0)]
    pub reward_min: Option<i32>,

    #[validate(
        required(message = "Missing data for required field."),
        range(min = 0, message = "Must be greater than or equal to 0.")
    )]
    #[schema(value_type = i32, minimum = 0)]
    pub reward_max: Option<i32>,

    #[validate(required(message = "Missing data for required field."))]
    #[schema(value_type = i64)]
    pub owner_id: Option<i64>,
}

/// A program payload that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgram {
    pub name: String,
    pub description: Option<String>,
    pub reward_min: i32,
    pub reward_max: i32,
    pub owner_id: i64,
}

impl TryFrom<CreateProgram> for NewProgram {
    type Error = DomainError;

    fn try_from(req: CreateProgram) -> Result<Self, Self::Error> {
        let reward_min = req.reward_min.unwrap_or_default();
        let reward_max = req.reward_max.unwrap_or_default();
        if reward_min > reward_max {
            return Err(DomainError::InvalidRewardRange {
                min: reward_min,
                max: reward_max,
            });
        }

        Ok(Self {
            name: req.name.unwrap_or_default(),
            description: req.description.filter(|d| !d.trim().is_empty()),
            reward_min,
            reward_max,
            owner_id: req.owner_id.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProgramResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub reward_min: i32,
    pub reward_max: i32,
    pub is_active: bool,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<program::Model> for ProgramResponse {
    fn from(p: program::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            reward_min: p.reward_min,
            reward_max: p.reward_max,
            is_active: p.is_active,
            owner_id: p.owner_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
