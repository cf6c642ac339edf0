/// Campus Crush API Library
///
/// REST backend for the Campus Crush social app: Google sign-in through
/// Firebase, profiles, posts with media, comments, reactions, friendships,
/// notifications and the friends feed.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers
/// - `models`: Row types and request/response schemas
/// - `services`: Business logic layer
/// - `db`: Repositories and embedded migrations
/// - `middleware`: JWT authentication, user extractors, request logging
/// - `metrics`: Prometheus collectors and the `/metrics` handler
/// - `ops`: Database and storage maintenance used by the CLI binaries
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod ops;
pub mod routes;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
