/// Business logic between the HTTP handlers and the repositories
pub mod auth;
pub mod comments;
pub mod email;
pub mod feed;
pub mod firebase;
pub mod friendships;
pub mod notifications;
pub mod posts;
pub mod reactions;
pub mod storage;
pub mod users;

pub use auth::AuthService;
pub use comments::CommentService;
pub use email::EmailService;
pub use feed::FeedService;
pub use firebase::FirebaseVerifier;
pub use friendships::FriendshipService;
pub use notifications::NotificationService;
pub use posts::PostService;
pub use reactions::ReactionService;
pub use storage::MediaStorage;
pub use users::UserService;
