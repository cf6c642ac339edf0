/// Notification inbox handlers
use crate::error::Result;
use crate::middleware::VerifiedUser;
use crate::models::notification::{NotificationListQuery, NotificationUpdate};
use crate::models::PaginationParams;
use crate::services::NotificationService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list_notifications(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    query: web::Query<NotificationListQuery>,
) -> Result<HttpResponse> {
    let page = PaginationParams {
        skip: query.skip,
        limit: query.limit,
    }
    .window(100, 200)?;

    let service = NotificationService::new((**pool).clone());
    let items = service
        .list_for_user(user.id, query.unread_only.unwrap_or(false), page.limit, page.skip)
        .await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn mark_all_read(pool: web::Data<PgPool>, user: VerifiedUser) -> Result<HttpResponse> {
    let service = NotificationService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.mark_all_read(user.id).await?))
}

pub async fn update_notification(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    notification_id: web::Path<Uuid>,
    body: web::Json<NotificationUpdate>,
) -> Result<HttpResponse> {
    let service = NotificationService::new((**pool).clone());
    let notification = service.mark(user.id, *notification_id, body.is_read).await?;
    Ok(HttpResponse::Ok().json(notification))
}

pub async fn delete_notification(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    notification_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = NotificationService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.delete(user.id, *notification_id).await?))
}

pub async fn delete_all_notifications(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
) -> Result<HttpResponse> {
    let service = NotificationService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.delete_all(user.id).await?))
}
