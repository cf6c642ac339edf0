/// Friendship handlers - requests, friend list and relationship status
use crate::error::Result;
use crate::middleware::VerifiedUser;
use crate::models::friendship::{FriendshipRequestCreate, FriendshipRequestUpdate, RequestStatusQuery};
use crate::models::UserResponse;
use crate::services::FriendshipService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn send_request(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    body: web::Json<FriendshipRequestCreate>,
) -> Result<HttpResponse> {
    let service = FriendshipService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.send_request(&user, body.receiver_id).await?))
}

pub async fn respond_to_request(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    request_id: web::Path<Uuid>,
    body: web::Json<FriendshipRequestUpdate>,
) -> Result<HttpResponse> {
    let service = FriendshipService::new((**pool).clone());
    let request = service.respond(&user, *request_id, &body.status).await?;
    Ok(HttpResponse::Ok().json(request))
}

pub async fn received_requests(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    query: web::Query<RequestStatusQuery>,
) -> Result<HttpResponse> {
    let service = FriendshipService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.received(user.id, query.status.as_deref()).await?))
}

pub async fn sent_requests(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    query: web::Query<RequestStatusQuery>,
) -> Result<HttpResponse> {
    let service = FriendshipService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.sent(user.id, query.status.as_deref()).await?))
}

pub async fn cancel_request(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    request_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = FriendshipService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.cancel(user.id, *request_id).await?))
}

pub async fn list_friends(pool: web::Data<PgPool>, user: VerifiedUser) -> Result<HttpResponse> {
    let service = FriendshipService::new((**pool).clone());
    let friends: Vec<UserResponse> = service
        .friends(user.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(friends))
}

pub async fn remove_friend(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    friend_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = FriendshipService::new((**pool).clone());
    service.remove_friend(user.id, *friend_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Friend removed successfully"
    })))
}

pub async fn friendship_status(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    other_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = FriendshipService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.status(user.id, *other_id).await?))
}
