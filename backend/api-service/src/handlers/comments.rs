/// Comment handlers - nested under `/posts/{post_id}/comments`
use crate::error::Result;
use crate::middleware::VerifiedUser;
use crate::models::comment::{CommentCreate, CommentUpdate};
use crate::models::PaginationParams;
use crate::services::CommentService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_comment(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    post_id: web::Path<Uuid>,
    body: web::Json<CommentCreate>,
) -> Result<HttpResponse> {
    let service = CommentService::new((**pool).clone());
    let comment = service.create(&user, *post_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn get_post_comments(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    post_id: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let page = query.window(100, 200)?;
    let service = CommentService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.list(*post_id, page).await?))
}

pub async fn get_latest_comment(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = CommentService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.latest(*post_id).await?))
}

pub async fn get_comment_replies(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    path: web::Path<(Uuid, Uuid)>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let page = query.window(100, 200)?;
    let service = CommentService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.replies(post_id, comment_id, page).await?))
}

pub async fn update_comment(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<CommentUpdate>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let service = CommentService::new((**pool).clone());
    let comment = service
        .update(user.id, post_id, comment_id, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn delete_comment(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let service = CommentService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.delete(user.id, post_id, comment_id).await?))
}
