use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "accepted" => Some(RequestStatus::Accepted),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    /// Parse the status a receiver may answer with.
    pub fn parse_response(value: &str) -> Result<Self, AppError> {
        match Self::parse(value) {
            Some(status @ (RequestStatus::Accepted | RequestStatus::Rejected)) => Ok(status),
            _ => Err(AppError::ValidationError(
                "Status must be one of: accepted, rejected".to_string(),
            )),
        }
    }
}

/// Friend request row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct FriendshipRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FriendshipRequest {
    pub fn status(&self) -> Option<RequestStatus> {
        RequestStatus::parse(&self.status)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipRequestCreate {
    pub receiver_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipRequestUpdate {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestStatusQuery {
    pub status: Option<String>,
}

/// Relationship between the caller and another user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    #[serde(rename = "self")]
    SelfUser,
    Friends,
    RequestSent,
    RequestReceived,
    NotFriends,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipStatusResponse {
    pub status: FriendshipStatus,
    pub request_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_only_accepts_final_states() {
        assert_eq!(
            RequestStatus::parse_response("accepted").unwrap(),
            RequestStatus::Accepted
        );
        assert_eq!(
            RequestStatus::parse_response("rejected").unwrap(),
            RequestStatus::Rejected
        );
        assert!(RequestStatus::parse_response("pending").is_err());
        assert!(RequestStatus::parse_response("ACCEPTED").is_err());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(FriendshipStatusResponse {
            status: FriendshipStatus::SelfUser,
            request_id: None,
        })
        .unwrap();
        assert_eq!(json["status"], "self");

        assert_eq!(
            serde_json::to_value(FriendshipStatus::RequestReceived).unwrap(),
            "request_received"
        );
    }
}
