//! Route table for `/api/v1`.
//!
//! Static segments are registered before `{id}` captures so that paths like
//! `/users/me` or `/notifications/mark-all-read` never reach a UUID extractor.

use crate::config::API_V1_PREFIX;
use crate::handlers::{
    auth, comments, feed, friends, health, media, notifications, posts, reactions, users,
};
use crate::middleware::JwtAuthMiddleware;
use actix_web::web;

/// Register every API route, including the unauthenticated root.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::root))
        .service(web::scope(API_V1_PREFIX).configure(api_v1));
}

fn api_v1(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_summary))
        .route("/health/ready", web::get().to(health::readiness_summary))
        .route("/health/live", web::get().to(health::liveness_check))
        .route("/media/{path:.*}", web::get().to(media::serve_media))
        .route("/static/{path:.*}", web::get().to(media::serve_static))
        .service(
            web::scope("/auth")
                .route("/google-signin", web::post().to(auth::google_signin))
                .route("/validate-token", web::get().to(auth::validate_token))
                .route("/firebase-status", web::get().to(auth::firebase_status)),
        )
        .service(
            web::scope("/users")
                .wrap(JwtAuthMiddleware)
                .route("", web::get().to(users::list_users))
                .route("/", web::get().to(users::list_users))
                .route("/me", web::get().to(users::get_me))
                .route("/me", web::put().to(users::update_me))
                .route("/by-username/{username}", web::get().to(users::get_by_username))
                .route("/search", web::get().to(users::search_users))
                .route("/profile-picture", web::post().to(users::upload_profile_picture))
                .route("/suggestions", web::get().to(users::get_suggestions))
                .route("/{user_id}", web::get().to(users::get_user))
                .route("/{user_id}/posts", web::get().to(users::get_user_posts)),
        )
        .service(
            web::scope("/posts")
                .wrap(JwtAuthMiddleware)
                .route("", web::get().to(posts::list_posts))
                .route("", web::post().to(posts::create_post))
                .route("/", web::get().to(posts::list_posts))
                .route("/", web::post().to(posts::create_post))
                .route("/user/{user_id}", web::get().to(posts::get_posts_by_user))
                .route("/check-media/{filename}", web::get().to(posts::check_media))
                .route("/{post_id}/comments", web::post().to(comments::create_comment))
                .route("/{post_id}/comments", web::get().to(comments::get_post_comments))
                .route("/{post_id}/comments/latest", web::get().to(comments::get_latest_comment))
                .route(
                    "/{post_id}/comments/{comment_id}/replies",
                    web::get().to(comments::get_comment_replies),
                )
                .route("/{post_id}/comments/{comment_id}", web::put().to(comments::update_comment))
                .route(
                    "/{post_id}/comments/{comment_id}",
                    web::delete().to(comments::delete_comment),
                )
                .route("/{post_id}/reactions", web::post().to(reactions::react_to_post))
                .route("/{post_id}/reactions", web::get().to(reactions::get_post_reactions))
                .route("/{post_id}/reactions", web::delete().to(reactions::delete_reaction))
                .route("/{post_id}/reactions/counts", web::get().to(reactions::get_reaction_counts))
                .route("/{post_id}", web::get().to(posts::get_post))
                .route("/{post_id}", web::put().to(posts::update_post))
                .route("/{post_id}", web::delete().to(posts::delete_post)),
        )
        .service(
            web::scope("/friends")
                .wrap(JwtAuthMiddleware)
                .route("", web::get().to(friends::list_friends))
                .route("/", web::get().to(friends::list_friends))
                .route("/request", web::post().to(friends::send_request))
                .route("/request/{request_id}", web::put().to(friends::respond_to_request))
                .route("/request/{request_id}", web::delete().to(friends::cancel_request))
                .route("/requests/received", web::get().to(friends::received_requests))
                .route("/requests/sent", web::get().to(friends::sent_requests))
                .route("/status/{user_id}", web::get().to(friends::friendship_status))
                .route("/{friend_id}", web::delete().to(friends::remove_friend)),
        )
        .service(
            web::scope("/notifications")
                .wrap(JwtAuthMiddleware)
                .route("", web::get().to(notifications::list_notifications))
                .route("", web::delete().to(notifications::delete_all_notifications))
                .route("/", web::get().to(notifications::list_notifications))
                .route("/", web::delete().to(notifications::delete_all_notifications))
                .route("/mark-all-read", web::put().to(notifications::mark_all_read))
                .route("/{notification_id}", web::put().to(notifications::update_notification))
                .route("/{notification_id}", web::delete().to(notifications::delete_notification)),
        )
        .service(
            web::scope("/feed")
                .wrap(JwtAuthMiddleware)
                .route("", web::get().to(feed::get_feed))
                .route("/", web::get().to(feed::get_feed)),
        );
}
