//! Administrator account creation.

use crate::db::user_repo;
use crate::models::user::{AuthProvider, NewUser, User};
use anyhow::{bail, Context, Result};
use crypto_core::{generate_strong_password, hash_password};
use sqlx::PgPool;
use tracing::info;

/// Password argument that asks for a generated password
pub const AUTO_PASSWORD: &str = "auto";
const GENERATED_PASSWORD_LENGTH: usize = 12;

#[derive(Debug)]
pub struct SuperuserOutcome {
    pub user: User,
    /// False when an existing account was promoted
    pub created: bool,
    /// Set when the password was generated and must be shown to the operator
    pub generated_password: Option<String>,
}

/// Local part of an email address, used as the base username.
pub fn username_base(email: &str) -> Result<String> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(local.to_string()),
        _ => bail!("'{}' is not a valid email address", email),
    }
}

/// Create an administrator, or promote the account already using `email`.
pub async fn create_superuser(
    pool: &PgPool,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<SuperuserOutcome> {
    let email = email.trim().to_lowercase();
    let base = username_base(&email)?;

    if let Some(existing) = user_repo::find_by_email(pool, &email).await? {
        let user = user_repo::promote_to_admin(pool, existing.id)
            .await
            .context("failed to promote existing user")?;
        info!(user_id = %user.id, "Promoted existing user to administrator");
        return Ok(SuperuserOutcome {
            user,
            created: false,
            generated_password: None,
        });
    }

    let (password, generated_password) = if password == AUTO_PASSWORD {
        let generated = generate_strong_password(GENERATED_PASSWORD_LENGTH);
        (generated.clone(), Some(generated))
    } else {
        (password.to_string(), None)
    };
    if password.is_empty() {
        bail!("password must not be empty");
    }

    let username = user_repo::available_username(pool, &base).await?;
    let new_user = NewUser {
        email,
        username,
        full_name: full_name.to_string(),
        hashed_password: Some(hash_password(&password).context("failed to hash password")?),
        profile_picture: None,
        university: None,
        is_verified: true,
        is_email_verified: true,
        is_admin: true,
        auth_provider: AuthProvider::Email,
    };

    let user = user_repo::create_user(pool, &new_user)
        .await
        .context("failed to create administrator")?;
    info!(user_id = %user.id, username = %user.username, "Created administrator");

    Ok(SuperuserOutcome {
        user,
        created: true,
        generated_password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_base() {
        assert_eq!(username_base("admin@campus.edu").unwrap(), "admin");
        assert!(username_base("admin").is_err());
        assert!(username_base("@campus.edu").is_err());
    }
}
