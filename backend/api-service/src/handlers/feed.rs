use crate::error::Result;
use crate::middleware::VerifiedUser;
use crate::models::PaginationParams;
use crate::services::FeedService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

/// Home feed: posts by the user and their friends
pub async fn get_feed(
    pool: web::Data<PgPool>,
    user: VerifiedUser,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let page = query.window(20, 100)?;
    let service = FeedService::new((**pool).clone());
    Ok(HttpResponse::Ok().json(service.home_feed(user.id, page).await?))
}
