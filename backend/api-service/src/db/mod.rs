/// Database access layer
///
/// Repositories are free functions over a `PgPool` (or a transaction
/// connection where several statements must commit together). Schema
/// changes live in `migrations/` and are embedded into the binaries.
pub mod comment_repo;
pub mod friendship_repo;
pub mod notification_repo;
pub mod post_repo;
pub mod reaction_repo;
pub mod user_repo;

use sqlx::migrate::Migrator;

/// Embedded, reversible migrations of the API schema.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Tables every fully migrated database must contain.
pub const EXPECTED_TABLES: &[&str] = &[
    "users",
    "posts",
    "comments",
    "reactions",
    "friendships",
    "friendship_requests",
    "notifications",
];
