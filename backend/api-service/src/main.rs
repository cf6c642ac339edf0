use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use campus_crush_api::config::{Config, API_V1_PREFIX};
use campus_crush_api::error::AppError;
use campus_crush_api::metrics::{serve_metrics, SERVICE_NAME};
use campus_crush_api::middleware::{AuthLogging, MetricsMiddleware, RequestLogging};
use campus_crush_api::ops::migrations::run_startup_migrations;
use campus_crush_api::routes;
use campus_crush_api::services::{EmailService, FirebaseVerifier, MediaStorage};
use campus_crush_api::telemetry::init_tracing;
use clap::{Parser, Subcommand};
use crypto_core::jwt::JwtKeys;
use db_pool::{create_pool, DbConfig};
use std::io;

/// Campus Crush API server
#[derive(Parser, Debug)]
#[clap(name = "campus-crush-api", version)]
struct Args {
    /// Bind address (overrides HOST)
    #[clap(long, env = "HOST")]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[clap(long, env = "PORT")]
    port: Option<u16>,

    /// Development mode: verbose logging
    #[clap(long)]
    reload: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the local health endpoint and exit non-zero when unhealthy
    Healthcheck,
}

async fn healthcheck(port: u16) -> io::Result<()> {
    let url = format!("http://127.0.0.1:{}{}/health", port, API_V1_PREFIX);
    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn cors_for(origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    for origin in origins {
        let origin = origin.trim();
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let host = args.host.clone().unwrap_or_else(|| config.app.host.clone());
    let port = args.port.unwrap_or(config.app.port);

    if let Some(Command::Healthcheck) = args.command {
        return healthcheck(port).await;
    }

    init_tracing(config.app.debug || args.reload);
    tracing::info!("Starting {} v{}", SERVICE_NAME, config.app.version);
    tracing::info!("Environment: {}", config.app.environment);

    let jwt_keys = JwtKeys::from_secret(
        &config.auth.secret_key,
        &config.auth.algorithm,
        config.auth.access_token_expire_minutes,
    )
    .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Invalid JWT settings: {e}")))?;

    let db_cfg = DbConfig::from_env(SERVICE_NAME).with_url(config.database.url.clone());
    db_cfg.log_config();
    let db_pool = match create_pool(db_cfg).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    match run_startup_migrations(&db_pool).await {
        Ok(created) if created.is_empty() => tracing::info!("Database schema is up to date"),
        Ok(created) => tracing::info!(tables = %created.join(", "), "Created database tables"),
        Err(e) => {
            tracing::error!("Startup migrations failed: {:#}", e);
            return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
        }
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.storage.upload_directory).await {
        tracing::warn!(
            dir = %config.storage.upload_directory.display(),
            "Failed to create upload directory: {}",
            e
        );
    }

    let storage = MediaStorage::from_config(&config).await;
    let firebase = FirebaseVerifier::new(config.firebase.project_id.clone());
    if !firebase.is_configured() {
        tracing::warn!("FIREBASE_PROJECT_ID not configured; Google sign-in will be rejected");
    }
    let email = EmailService::new(&config.email, &config.app.frontend_url)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let bind_address = format!("{}:{}", host, port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let pool_data = web::Data::new(db_pool);
    let config_data = web::Data::new(config.clone());
    let storage_data = web::Data::new(storage);
    let firebase_data = web::Data::new(firebase);
    let jwt_data = web::Data::new(jwt_keys);
    let email_data = web::Data::new(email);
    let allowed_origins = config.cors.allowed_origins.clone();

    let server = HttpServer::new(move || {
        let json_config = web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());
        let query_config = web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into());

        App::new()
            .app_data(pool_data.clone())
            .app_data(config_data.clone())
            .app_data(storage_data.clone())
            .app_data(firebase_data.clone())
            .app_data(jwt_data.clone())
            .app_data(email_data.clone())
            .app_data(json_config)
            .app_data(query_config)
            .wrap(MetricsMiddleware)
            .wrap(AuthLogging)
            .wrap(RequestLogging)
            .wrap(cors_for(&allowed_origins))
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(serve_metrics))
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .shutdown_timeout(30)
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            match result {
                Ok(result) => result?,
                Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            if let Err(e) = server_task.await {
                tracing::error!("Server task join error: {}", e);
            }
        }
    }

    tracing::info!("{} shut down", SERVICE_NAME);
    Ok(())
}
