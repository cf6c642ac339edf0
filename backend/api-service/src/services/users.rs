/// User profiles, search and people-you-may-know suggestions
use crate::db::{friendship_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::models::user::{SuggestionsResponse, UserUpdate};
use crate::models::{Page, Post, User, UserResponse};
use crate::db::user_repo::UserChanges;
use crypto_core::hash_password;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

pub const SEARCH_LIMIT: i64 = 20;

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<User> {
        user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User> {
        user_repo::find_by_username(&self.pool, username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn list(&self, page: Page) -> Result<Vec<User>> {
        Ok(user_repo::list_users(&self.pool, page.limit, page.skip).await?)
    }

    /// Apply a partial profile update to `user`.
    pub async fn update_profile(&self, user: &User, update: UserUpdate) -> Result<User> {
        update.validate()?;

        let email = update.email.map(|e| e.trim().to_lowercase());
        if let Some(email) = email.as_deref().filter(|e| !e.eq_ignore_ascii_case(&user.email)) {
            if user_repo::find_by_email(&self.pool, email).await?.is_some() {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }
        if let Some(username) = update.username.as_deref().filter(|u| *u != user.username) {
            if user_repo::username_exists(&self.pool, username).await? {
                return Err(AppError::Conflict("Username already taken".to_string()));
            }
        }

        let hashed_password = match update.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let changes = UserChanges {
            email,
            username: update.username,
            full_name: update.full_name,
            hashed_password,
            bio: update.bio,
            profile_picture: update.profile_picture,
            university: update.university,
            department: update.department,
            graduation_year: update.graduation_year,
        };

        let updated = user_repo::update_user(&self.pool, user.id, &changes).await?;
        info!(user_id = %user.id, "Updated user profile");
        Ok(updated)
    }

    pub async fn set_profile_picture(&self, user_id: Uuid, url: &str) -> Result<User> {
        Ok(user_repo::set_profile_picture(&self.pool, user_id, url).await?)
    }

    /// Verified users other than `current_user_id` matching every word of `query`.
    pub async fn search(&self, current_user_id: Uuid, query: &str) -> Result<Vec<User>> {
        let terms = search_terms(query)?;
        Ok(user_repo::search_users(&self.pool, &terms, current_user_id, SEARCH_LIMIT).await?)
    }

    pub async fn suggestions(
        &self,
        current_user_id: Uuid,
        exclude_friends: bool,
        page: Page,
    ) -> Result<SuggestionsResponse> {
        match friendship_repo::repair_one_way_friendships(&self.pool).await {
            Ok(0) => {}
            Ok(repaired) => warn!(repaired, "Fixed one-way friendships"),
            Err(e) => warn!("Failed to repair one-way friendships: {}", e),
        }

        let (users, total) = user_repo::suggestions(
            &self.pool,
            current_user_id,
            exclude_friends,
            page.limit,
            page.skip,
        )
        .await?;

        let items = users
            .into_iter()
            .map(|user| {
                let mut response = UserResponse::from(user);
                if response.profile_picture.as_deref().map_or(true, str::is_empty) {
                    response.profile_picture = Some(fallback_avatar_url(&response.full_name));
                }
                response
            })
            .collect();

        Ok(SuggestionsResponse {
            items,
            total,
            limit: page.limit,
            skip: page.skip,
        })
    }

    pub async fn posts_of(&self, user_id: Uuid, page: Page) -> Result<Vec<Post>> {
        self.get(user_id).await?;
        Ok(post_repo::find_posts_by_author(&self.pool, user_id, page.limit, page.skip).await?)
    }
}

/// Lowercase search words; the query must have at least two characters.
pub fn search_terms(query: &str) -> Result<Vec<String>> {
    let query = query.trim();
    if query.chars().count() < 2 {
        return Err(AppError::ValidationError(
            "Search query must be at least 2 characters".to_string(),
        ));
    }

    Ok(query
        .split_whitespace()
        .map(|term| term.to_lowercase())
        .collect())
}

/// Generated avatar for users without a profile picture
pub fn fallback_avatar_url(full_name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=random&color=fff&size=256",
        urlencoding::encode(full_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_terms() {
        assert_eq!(search_terms(" Ada  LOVE ").unwrap(), vec!["ada", "love"]);
        assert!(search_terms("a").is_err());
        assert!(search_terms("   ").is_err());
    }

    #[test]
    fn test_fallback_avatar_url() {
        assert_eq!(
            fallback_avatar_url("Ada Lovelace"),
            "https://ui-avatars.com/api/?name=Ada%20Lovelace&background=random&color=fff&size=256"
        );
    }
}
