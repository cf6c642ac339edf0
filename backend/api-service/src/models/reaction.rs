use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

/// Allowed reactions, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Love,
    Haha,
    Wow,
    Sad,
    Angry,
}

impl ReactionType {
    pub const ALL: [ReactionType; 6] = [
        ReactionType::Like,
        ReactionType::Love,
        ReactionType::Haha,
        ReactionType::Wow,
        ReactionType::Sad,
        ReactionType::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Love => "love",
            ReactionType::Haha => "haha",
            ReactionType::Wow => "wow",
            ReactionType::Sad => "sad",
            ReactionType::Angry => "angry",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                AppError::ValidationError(format!(
                    "Reaction type must be one of: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// Reaction row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Reaction {
    pub id: Uuid,
    pub reaction_type: String,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionCreate {
    pub reaction_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ReactionCount {
    pub reaction_type: String,
    pub count: i64,
}
