/// HTTP handlers for the Campus Crush API
///
/// Handlers extract request data, call a service and serialize the result.
/// Authentication happens in `JwtAuthMiddleware` plus the `CurrentUser` /
/// `VerifiedUser` extractors.
pub mod auth;
pub mod comments;
pub mod feed;
pub mod friends;
pub mod health;
pub mod media;
pub mod multipart;
pub mod notifications;
pub mod posts;
pub mod reactions;
pub mod users;
