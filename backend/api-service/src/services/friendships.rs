/// Friend requests and the symmetric friendship graph
///
/// A friendship is stored as two rows, one per direction. Accepting a request
/// and removing a friend touch both rows inside one transaction.
use crate::db::{friendship_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::friendship::FriendshipStatusResponse;
use crate::models::{FriendshipRequest, FriendshipStatus, NotificationType, RequestStatus, User};
use crate::services::notifications::NotificationService;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

pub struct FriendshipService {
    pool: PgPool,
}

impl FriendshipService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn request(&self, request_id: Uuid) -> Result<FriendshipRequest> {
        friendship_repo::find_request_by_id(&self.pool, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Friend request not found".to_string()))
    }

    pub async fn send_request(&self, sender: &User, receiver_id: Uuid) -> Result<FriendshipRequest> {
        if user_repo::find_by_id(&self.pool, receiver_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if receiver_id == sender.id {
            return Err(AppError::BadRequest(
                "Cannot send friend request to yourself".to_string(),
            ));
        }
        if friendship_repo::are_friends(&self.pool, sender.id, receiver_id).await? {
            return Err(AppError::BadRequest("Already friends with this user".to_string()));
        }
        if friendship_repo::find_request_between(&self.pool, sender.id, receiver_id)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest("Friend request already sent".to_string()));
        }
        if friendship_repo::find_request_between(&self.pool, receiver_id, sender.id)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(
                "This user has already sent you a friend request".to_string(),
            ));
        }

        let request = friendship_repo::create_request(&self.pool, sender.id, receiver_id).await?;
        info!(request_id = %request.id, sender = %sender.id, receiver = %receiver_id, "Friend request sent");

        NotificationService::new(self.pool.clone())
            .notify(receiver_id, sender, NotificationType::FriendRequest, Some(request.id))
            .await;

        Ok(request)
    }

    /// Accept or reject a pending request addressed to `receiver`.
    pub async fn respond(&self, receiver: &User, request_id: Uuid, status: &str) -> Result<FriendshipRequest> {
        let decision = RequestStatus::parse_response(status)?;
        let request = self.request(request_id).await?;
        if request.receiver_id != receiver.id {
            return Err(AppError::Forbidden("Not enough permissions".to_string()));
        }
        if request.status() != Some(RequestStatus::Pending) {
            return Err(AppError::BadRequest(format!(
                "Friend request already {}",
                request.status
            )));
        }

        let mut tx = self.pool.begin().await?;
        let answered = friendship_repo::answer_request(&mut *tx, request_id, decision.as_str())
            .await?
            .ok_or_else(|| AppError::BadRequest("Friend request already answered".to_string()))?;
        if decision == RequestStatus::Accepted {
            friendship_repo::insert_friendship_pair(&mut *tx, answered.sender_id, answered.receiver_id)
                .await?;
        }
        tx.commit().await?;

        info!(request_id = %request_id, status = decision.as_str(), "Friend request answered");

        if decision == RequestStatus::Accepted {
            NotificationService::new(self.pool.clone())
                .notify(answered.sender_id, receiver, NotificationType::FriendAccepted, None)
                .await;
        }

        Ok(answered)
    }

    pub async fn received(&self, user_id: Uuid, status: Option<&str>) -> Result<Vec<FriendshipRequest>> {
        let status = status.unwrap_or(RequestStatus::Pending.as_str());
        Ok(friendship_repo::find_received_requests(&self.pool, user_id, Some(status)).await?)
    }

    pub async fn sent(&self, user_id: Uuid, status: Option<&str>) -> Result<Vec<FriendshipRequest>> {
        Ok(friendship_repo::find_sent_requests(&self.pool, user_id, status).await?)
    }

    /// Withdraw a request the user sent.
    pub async fn cancel(&self, user_id: Uuid, request_id: Uuid) -> Result<FriendshipRequest> {
        let request = self.request(request_id).await?;
        if request.sender_id != user_id {
            return Err(AppError::Forbidden("Not enough permissions".to_string()));
        }
        friendship_repo::delete_request(&self.pool, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Friend request not found".to_string()))
    }

    pub async fn friends(&self, user_id: Uuid) -> Result<Vec<User>> {
        Ok(friendship_repo::find_friends(&self.pool, user_id).await?)
    }

    pub async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<()> {
        if user_repo::find_by_id(&self.pool, friend_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if !friendship_repo::are_friends(&self.pool, user_id, friend_id).await? {
            return Err(AppError::BadRequest("Not friends with this user".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        let removed = friendship_repo::delete_friendship_pair(&mut *tx, user_id, friend_id).await?;
        tx.commit().await?;

        info!(user_id = %user_id, friend_id = %friend_id, removed, "Friend removed");
        Ok(())
    }

    pub async fn status(&self, user_id: Uuid, other_id: Uuid) -> Result<FriendshipStatusResponse> {
        user_repo::find_by_id(&self.pool, other_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user_id == other_id {
            return Ok(FriendshipStatusResponse {
                status: FriendshipStatus::SelfUser,
                request_id: None,
            });
        }

        if friendship_repo::are_friends(&self.pool, user_id, other_id).await? {
            return Ok(FriendshipStatusResponse {
                status: FriendshipStatus::Friends,
                request_id: None,
            });
        }

        if let Some(sent) = friendship_repo::find_request_between(&self.pool, user_id, other_id).await? {
            return Ok(FriendshipStatusResponse {
                status: FriendshipStatus::RequestSent,
                request_id: Some(sent.id),
            });
        }

        if let Some(received) =
            friendship_repo::find_request_between(&self.pool, other_id, user_id).await?
        {
            return Ok(FriendshipStatusResponse {
                status: FriendshipStatus::RequestReceived,
                request_id: Some(received.id),
            });
        }

        Ok(FriendshipStatusResponse {
            status: FriendshipStatus::NotFriends,
            request_id: None,
        })
    }
}
