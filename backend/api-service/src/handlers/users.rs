/// User handlers - profiles, search, suggestions and profile pictures
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::handlers::multipart::read_form;
use crate::middleware::{CurrentUser, VerifiedUser};
use crate::models::user::{ProfilePictureResponse, SearchQuery, SuggestionsQuery, UserUpdate};
use crate::models::{PaginationParams, UserResponse};
use crate::services::storage::{allowed_extension, content_type_for, PROFILE_PICTURES_PREFIX, PROFILE_PICTURE_EXTENSIONS};
use crate::services::{MediaStorage, UserService};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

fn respond_users(users: Vec<crate::models::User>) -> HttpResponse {
    let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    HttpResponse::Ok().json(users)
}

pub async fn get_me(user: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse::from(user.0)))
}

pub async fn update_me(
    pool: web::Data<PgPool>,
    user: CurrentUser,
    body: web::Json<UserUpdate>,
) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    let updated = service.update_profile(&user, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

pub async fn get_by_username(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    let found = service.get_by_username(&username).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(found)))
}

pub async fn search_users(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    let users = service.search(user.id, &query.q).await?;
    Ok(respond_users(users))
}

/// Upload a profile picture (multipart field `profile_picture`).
pub async fn upload_profile_picture(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<MediaStorage>,
    user: CurrentUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = read_form(payload, &["profile_picture"], config.storage.max_upload_size).await?;
    let file = form
        .take_file("profile_picture")
        .ok_or_else(|| AppError::ValidationError("profile_picture file is required".to_string()))?;

    let extension = allowed_extension(&file.filename, PROFILE_PICTURE_EXTENSIONS)?;
    let key = format!("{}/{}{}", PROFILE_PICTURES_PREFIX, user.id, extension);
    let stored = storage
        .store(&key, file.bytes, content_type_for(&key))
        .await
        .map_err(|e| {
            error!(user_id = %user.id, "Profile picture upload failed: {}", e);
            AppError::Storage("Failed to upload profile picture".to_string())
        })?;

    let service = UserService::new((**pool).clone());
    service.set_profile_picture(user.id, &stored.url).await?;
    info!(user_id = %user.id, storage = stored.storage.label(), "Profile picture updated");

    Ok(HttpResponse::Ok().json(ProfilePictureResponse {
        message: "Profile picture uploaded successfully".to_string(),
        profile_picture_url: stored.url,
        storage_type: stored.storage.label().to_string(),
    }))
}

pub async fn get_suggestions(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    query: web::Query<SuggestionsQuery>,
) -> Result<HttpResponse> {
    let page = PaginationParams {
        skip: query.skip,
        limit: query.limit,
    }
    .window(20, 50)?;

    let service = UserService::new((**pool).clone());
    let suggestions = service
        .suggestions(user.id, query.exclude_friends.unwrap_or(true), page)
        .await?;
    Ok(HttpResponse::Ok().json(suggestions))
}

pub async fn list_users(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let page = query.window(50, 50)?;
    let service = UserService::new((**pool).clone());
    Ok(respond_users(service.list(page).await?))
}

pub async fn get_user(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    let found = service.get(*user_id).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(found)))
}

pub async fn get_user_posts(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    user_id: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let page = query.window(20, 50)?;
    let service = UserService::new((**pool).clone());
    let posts = service.posts_of(*user_id, page).await?;
    Ok(HttpResponse::Ok().json(posts))
}
