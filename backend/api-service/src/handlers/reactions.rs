/// Reaction handlers - nested under `/posts/{post_id}/reactions`
use crate::error::Result;
use crate::middleware::VerifiedUser;
use crate::models::reaction::ReactionCreate;
use crate::models::PaginationParams;
use crate::services::ReactionService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn react_to_post(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    post_id: web::Path<Uuid>,
    body: web::Json<ReactionCreate>,
) -> Result<HttpResponse> {
    let service = ReactionService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.react(&user, *post_id, &body).await?))
}

pub async fn get_post_reactions(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    post_id: web::Path<Uuid>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let page = query.window(100, 200)?;
    let service = ReactionService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.list(*post_id, page).await?))
}

pub async fn get_reaction_counts(
    pool: web::Data<PgPool>,
    _user: VerifiedUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = ReactionService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.counts(*post_id).await?))
}

pub async fn delete_reaction(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = ReactionService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.remove(user.id, *post_id).await?))
}
