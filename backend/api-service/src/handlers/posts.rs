/// Post handlers - HTTP endpoints for post operations
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::handlers::multipart::read_form;
use crate::middleware::VerifiedUser;
use crate::models::post::PostUpdate;
use crate::models::PaginationParams;
use crate::services::posts::MediaUpload;
use crate::services::{MediaStorage, PostService};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list_posts(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let page = query.window(20, 200)?;
    let service = PostService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.list(page).await?))
}

/// Create a post from multipart fields `content` and optional `media`.
pub async fn create_post(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<MediaStorage>,
    user: VerifiedUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = read_form(payload, &["content", "media"], config.storage.max_upload_size).await?;
    let content = form
        .take_field("content")
        .ok_or_else(|| AppError::ValidationError("content is required".to_string()))?;
    let media = form.take_file("media").map(|file| MediaUpload {
        filename: file.filename,
        bytes: file.bytes,
    });

    let service = PostService::new((**pool).clone());
    let post = service.create(&storage, user.id, &content, media).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn get_post(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.get(*post_id).await?))
}

pub async fn update_post(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    post_id: web::Path<Uuid>,
    body: web::Json<PostUpdate>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone());
    let post = service.update(user.id, *post_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    pool: web::Data<PgPool>,
    storage: web::Data<MediaStorage>,
    user: VerifiedUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new((**pool).clone());
    let deleted = service.delete(&storage, user.id, *post_id).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

pub async fn get_posts_by_user(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    user_id: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let page = query.window(100, 200)?;
    let service = PostService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.list_by_author(*user_id, page).await?))
}

/// Where a post media file is stored; only available with `DEBUG`.
pub async fn check_media(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<MediaStorage>,
    _user: VerifiedUser,
    filename: web::Path<String>,
) -> Result<HttpResponse> {
    if !config.app.debug {
        return Err(AppError::NotFound("Not found".to_string()));
    }

    let service = PostService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.check_media(&storage, &filename).await?))
}
