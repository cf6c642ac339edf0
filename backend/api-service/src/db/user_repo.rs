use crate::models::user::{NewUser, User};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub(crate) const USER_COLUMNS: &str = "id, email, username, full_name, hashed_password, bio, \
    profile_picture, university, department, graduation_year, is_active, is_verified, \
    is_email_verified, is_admin, auth_provider, created_at, updated_at";

/// Profile fields to overwrite; `None` leaves the column untouched.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub hashed_password: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub university: Option<String>,
    pub department: Option<String>,
    pub graduation_year: Option<String>,
}

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Case-insensitive email lookup
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = $1",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await
}

/// First free username among `base`, `base1`, `base2`, ...
pub async fn available_username(pool: &PgPool, base: &str) -> Result<String, sqlx::Error> {
    let mut candidate = base.to_string();
    let mut counter = 1u32;
    while username_exists(pool, &candidate).await? {
        candidate = format!("{}{}", base, counter);
        counter += 1;
    }
    Ok(candidate)
}

pub async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (
            id, email, username, full_name, hashed_password, profile_picture, university,
            is_active, is_verified, is_email_verified, is_admin, auth_provider
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $9, $10, $11)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(&new_user.email)
    .bind(&new_user.username)
    .bind(&new_user.full_name)
    .bind(&new_user.hashed_password)
    .bind(&new_user.profile_picture)
    .bind(&new_user.university)
    .bind(new_user.is_verified)
    .bind(new_user.is_email_verified)
    .bind(new_user.is_admin)
    .bind(new_user.auth_provider.as_str())
    .fetch_one(pool)
    .await
}

pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    changes: &UserChanges,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            email = COALESCE($2, email),
            username = COALESCE($3, username),
            full_name = COALESCE($4, full_name),
            hashed_password = COALESCE($5, hashed_password),
            bio = COALESCE($6, bio),
            profile_picture = COALESCE($7, profile_picture),
            university = COALESCE($8, university),
            department = COALESCE($9, department),
            graduation_year = COALESCE($10, graduation_year),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user_id)
    .bind(&changes.email)
    .bind(&changes.username)
    .bind(&changes.full_name)
    .bind(&changes.hashed_password)
    .bind(&changes.bio)
    .bind(&changes.profile_picture)
    .bind(&changes.university)
    .bind(&changes.department)
    .bind(&changes.graduation_year)
    .fetch_one(pool)
    .await
}

/// Switch an existing account to Google sign-in.
///
/// `picture` is only stored when the user has no profile picture yet.
pub async fn link_google_account(
    pool: &PgPool,
    user_id: Uuid,
    picture: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            auth_provider = 'google',
            profile_picture = COALESCE(NULLIF(profile_picture, ''), $2),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user_id)
    .bind(picture)
    .fetch_one(pool)
    .await
}

pub async fn set_profile_picture(
    pool: &PgPool,
    user_id: Uuid,
    url: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET profile_picture = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(user_id)
    .bind(url)
    .fetch_one(pool)
    .await
}

/// Promote an account to a verified administrator.
pub async fn promote_to_admin(pool: &PgPool, user_id: Uuid) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            is_admin = TRUE, is_verified = TRUE, is_email_verified = TRUE, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn list_users(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY created_at, id LIMIT $1 OFFSET $2",
        USER_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Verified users other than `exclude_id` matching every term.
///
/// A term matches when it is contained (case-insensitively) in the full
/// name, username or email.
pub async fn search_users(
    pool: &PgPool,
    terms: &[String],
    exclude_id: Uuid,
    limit: i64,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {} FROM users u
        WHERE u.id <> $2
          AND u.is_verified = TRUE
          AND NOT EXISTS (
              SELECT 1 FROM UNNEST($1::text[]) AS term
              WHERE NOT (
                  u.full_name ILIKE '%' || term || '%'
                  OR u.username ILIKE '%' || term || '%'
                  OR u.email ILIKE '%' || term || '%'
              )
          )
        ORDER BY u.username
        LIMIT $3
        "#,
        USER_COLUMNS
    ))
    .bind(terms)
    .bind(exclude_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

const SUGGESTION_FILTER: &str = r#"
    u.id <> $1
    AND u.is_verified = TRUE
    AND (NOT $2 OR NOT EXISTS (
        SELECT 1 FROM friendships f WHERE f.user_id = $1 AND f.friend_id = u.id
    ))
    AND NOT EXISTS (
        SELECT 1 FROM friendship_requests r
        WHERE r.status = 'pending'
          AND ((r.sender_id = $1 AND r.receiver_id = u.id)
            OR (r.sender_id = u.id AND r.receiver_id = $1))
    )
"#;

/// People-you-may-know candidates for `user_id`, with the unpaged total.
pub async fn suggestions(
    pool: &PgPool,
    user_id: Uuid,
    exclude_friends: bool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<User>, i64), sqlx::Error> {
    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM users u WHERE {}",
        SUGGESTION_FILTER
    ))
    .bind(user_id)
    .bind(exclude_friends)
    .fetch_one(pool)
    .await?;

    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users u WHERE {} ORDER BY u.created_at DESC, u.id LIMIT $3 OFFSET $4",
        USER_COLUMNS, SUGGESTION_FILTER
    ))
    .bind(user_id)
    .bind(exclude_friends)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((users, total))
}

/// Delete a user row. Dependent rows must be removed first.
pub async fn delete_user(conn: &mut PgConnection, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Rewrite profile picture URLs starting with `from_prefix` to start with `to_prefix`.
pub async fn rewrite_profile_picture_prefix(
    pool: &PgPool,
    from_prefix: &str,
    to_prefix: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET profile_picture = $2 || SUBSTRING(profile_picture FROM CHAR_LENGTH($1) + 1)
        WHERE LEFT(profile_picture, CHAR_LENGTH($1)) = $1
        "#,
    )
    .bind(from_prefix)
    .bind(to_prefix)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
