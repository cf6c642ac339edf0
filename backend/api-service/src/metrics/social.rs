use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    /// Google sign-ins by outcome (success/rejected).
    pub static ref SIGNIN_TOTAL: IntCounterVec = register_int_counter_vec!(
        "campus_signin_total",
        "Google sign-in attempts segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register campus_signin_total");

    /// Media uploads by destination (r2/local).
    pub static ref MEDIA_UPLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "campus_media_uploads_total",
        "Stored media uploads segmented by destination",
        &["storage"]
    )
    .expect("failed to register campus_media_uploads_total");

    /// Notifications written by type and result (created/error).
    pub static ref NOTIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "campus_notifications_total",
        "Notifications segmented by type and result",
        &["type", "result"]
    )
    .expect("failed to register campus_notifications_total");
}
