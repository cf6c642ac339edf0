/// Configuration management for the Campus Crush API
///
/// Everything is read from environment variables (a `.env` file is loaded by
/// the binaries before this runs).
use db_pool::env_utils::{env_non_empty, parse_env_bool, parse_env_with_default};
use s3_utils::R2Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const API_V1_PREFIX: &str = "/api/v1";
pub const PROJECT_NAME: &str = "CampusCrush API";
pub const DEFAULT_SECRET_KEY: &str = "development_secret_key";
pub const DEFAULT_BASE_URL: &str = "https://campuscrush-sb89.onrender.com";
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Origins accepted when `BACKEND_CORS_ORIGINS` is not set.
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://192.168.0.101:3000",
    "http://localhost:3000",
    "http://10.0.2.2:3000",
    "capacitor://localhost",
    "file://",
    "http://localhost",
    "*",
];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub firebase: FirebaseConfig,
    pub storage: StorageConfig,
    pub email: EmailConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub project_name: String,
    pub version: String,
    /// `development` or `production`
    pub environment: String,
    pub debug: bool,
    pub host: String,
    pub port: u16,
    /// Public base URL, used to build proxy and local media URLs
    pub base_url: String,
    /// Deep-link base used in outgoing emails
    pub frontend_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    /// Lowercase email domains allowed to sign in; empty means any
    pub allowed_email_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Expected audience of Firebase ID tokens
    pub project_id: Option<String>,
    pub service_account_path: String,
    /// Whether `FIREBASE_SERVICE_ACCOUNT` carried inline credentials
    pub service_account_env_present: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub upload_directory: PathBuf,
    pub max_upload_size: usize,
    pub r2: R2Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Empty host disables outgoing mail
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    #[serde(skip_serializing)]
    pub smtp_password: String,
    pub from_address: String,
    pub use_starttls: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let environment =
            env_non_empty("ENVIRONMENT").unwrap_or_else(|| "production".to_string());
        let is_production = environment.eq_ignore_ascii_case("production");

        let secret_key =
            env_non_empty("SECRET_KEY").unwrap_or_else(|| DEFAULT_SECRET_KEY.to_string());
        if is_production && secret_key == DEFAULT_SECRET_KEY {
            return Err("SECRET_KEY must be set to a non-default value in production".to_string());
        }

        let algorithm = env_non_empty("ALGORITHM").unwrap_or_else(|| "HS256".to_string());
        crypto_core::jwt::parse_algorithm(&algorithm).map_err(|e| e.to_string())?;

        let service_account_path = env_non_empty("FIREBASE_SERVICE_ACCOUNT_PATH")
            .unwrap_or_else(|| "firebase-service-account.json".to_string());
        let inline_service_account = env_non_empty("FIREBASE_SERVICE_ACCOUNT");
        let project_id = env_non_empty("FIREBASE_PROJECT_ID")
            .or_else(|| {
                inline_service_account
                    .as_deref()
                    .and_then(project_id_from_service_account)
            })
            .or_else(|| {
                std::fs::read_to_string(&service_account_path)
                    .ok()
                    .as_deref()
                    .and_then(project_id_from_service_account)
            });

        let max_upload_size = parse_env_with_default("MAX_UPLOAD_SIZE", DEFAULT_MAX_UPLOAD_SIZE);
        if max_upload_size == 0 {
            return Err("MAX_UPLOAD_SIZE must be greater than zero".to_string());
        }

        Ok(Config {
            app: AppConfig {
                project_name: PROJECT_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                environment,
                debug: parse_env_bool("DEBUG", false),
                host: env_non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_env_with_default("PORT", 8000),
                base_url: env_non_empty("BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                frontend_url: env_non_empty("FRONTEND_URL")
                    .unwrap_or_else(|| "campuscrush://".to_string()),
            },
            cors: CorsConfig {
                allowed_origins: match env_non_empty("BACKEND_CORS_ORIGINS") {
                    Some(raw) => parse_list(&raw).unwrap_or_default(),
                    None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
                },
            },
            database: DatabaseConfig {
                url: env_non_empty("DATABASE_URL")
                    .unwrap_or_else(|| db_pool::DEFAULT_DATABASE_URL.to_string()),
            },
            auth: AuthConfig {
                secret_key,
                algorithm,
                access_token_expire_minutes: parse_env_with_default(
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    crypto_core::jwt::DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
                ),
                allowed_email_domains: env_non_empty("ALLOWED_EMAIL_DOMAINS")
                    .map(|raw| parse_list(&raw).unwrap_or_else(|| vec![raw.clone()]))
                    .unwrap_or_default()
                    .into_iter()
                    .map(|d| d.trim_start_matches('@').to_ascii_lowercase())
                    .filter(|d| !d.is_empty())
                    .collect(),
            },
            firebase: FirebaseConfig {
                api_key: env_non_empty("FIREBASE_API_KEY"),
                project_id,
                service_account_path,
                service_account_env_present: inline_service_account.is_some(),
            },
            storage: StorageConfig {
                upload_directory: PathBuf::from(
                    env_non_empty("UPLOAD_DIRECTORY").unwrap_or_else(|| "uploads".to_string()),
                ),
                max_upload_size,
                r2: R2Config::from_env(),
            },
            email: EmailConfig {
                smtp_host: env_non_empty("MAIL_SERVER").unwrap_or_default(),
                smtp_port: parse_env_with_default("MAIL_PORT", 587),
                smtp_username: env_non_empty("MAIL_USERNAME").unwrap_or_default(),
                smtp_password: env_non_empty("MAIL_PASSWORD").unwrap_or_default(),
                from_address: env_non_empty("MAIL_FROM")
                    .unwrap_or_else(|| "noreply@campuscrush.app".to_string()),
                use_starttls: parse_env_bool("MAIL_STARTTLS", true),
            },
        })
    }

    pub fn is_development(&self) -> bool {
        self.app.environment.eq_ignore_ascii_case("development")
    }

    pub fn is_production(&self) -> bool {
        self.app.environment.eq_ignore_ascii_case("production")
    }

    /// Configuration for tests: development mode, local storage only, no mail.
    pub fn for_tests(upload_directory: &Path) -> Self {
        Config {
            app: AppConfig {
                project_name: PROJECT_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                environment: "development".to_string(),
                debug: true,
                host: "127.0.0.1".to_string(),
                port: 0,
                base_url: "http://localhost:8000".to_string(),
                frontend_url: "campuscrush://".to_string(),
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: db_pool::DEFAULT_DATABASE_URL.to_string(),
            },
            auth: AuthConfig {
                secret_key: "test-secret-key".to_string(),
                algorithm: "HS256".to_string(),
                access_token_expire_minutes: crypto_core::jwt::DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
                allowed_email_domains: Vec::new(),
            },
            firebase: FirebaseConfig {
                api_key: None,
                project_id: None,
                service_account_path: "firebase-service-account.json".to_string(),
                service_account_env_present: false,
            },
            storage: StorageConfig {
                upload_directory: upload_directory.to_path_buf(),
                max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
                r2: R2Config::default(),
            },
            email: EmailConfig {
                smtp_host: String::new(),
                smtp_port: 587,
                smtp_username: String::new(),
                smtp_password: String::new(),
                from_address: "noreply@campuscrush.app".to_string(),
                use_starttls: true,
            },
        }
    }
}

/// Parse a comma separated list or a JSON array of strings.
///
/// Returns `None` for malformed JSON.
pub fn parse_list(raw: &str) -> Option<Vec<String>> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(raw).ok();
    }

    Some(
        raw.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

fn project_id_from_service_account(json: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(json)
        .ok()?
        .get("project_id")?
        .as_str()
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "ENVIRONMENT",
        "SECRET_KEY",
        "ALGORITHM",
        "BACKEND_CORS_ORIGINS",
        "ALLOWED_EMAIL_DOMAINS",
        "FIREBASE_PROJECT_ID",
        "FIREBASE_SERVICE_ACCOUNT",
        "FIREBASE_SERVICE_ACCOUNT_PATH",
        "BASE_URL",
        "DEBUG",
        "MAX_UPLOAD_SIZE",
        "ACCESS_TOKEN_EXPIRE_MINUTES",
    ];

    fn clear_env() {
        for key in VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_parse_list_forms() {
        assert_eq!(
            parse_list("a.edu, b.edu ,").unwrap(),
            vec!["a.edu".to_string(), "b.edu".to_string()]
        );
        assert_eq!(
            parse_list(r#"["http://x", "http://y"]"#).unwrap(),
            vec!["http://x".to_string(), "http://y".to_string()]
        );
        assert_eq!(parse_list("[broken"), None);
    }

    #[test]
    #[serial]
    fn test_production_rejects_default_secret() {
        clear_env();

        let err = Config::from_env().unwrap_err();
        assert!(err.contains("SECRET_KEY"));
    }

    #[test]
    #[serial]
    fn test_development_defaults() {
        clear_env();
        std::env::set_var("ENVIRONMENT", "development");
        std::env::set_var("FIREBASE_SERVICE_ACCOUNT_PATH", "/nonexistent/sa.json");

        let config = Config::from_env().unwrap();
        assert!(config.is_development());
        assert_eq!(config.auth.secret_key, DEFAULT_SECRET_KEY);
        assert_eq!(config.auth.access_token_expire_minutes, 10_080);
        assert_eq!(config.app.base_url, DEFAULT_BASE_URL);
        assert!(config.cors.allowed_origins.contains(&"*".to_string()));
        assert!(config.auth.allowed_email_domains.is_empty());
        assert_eq!(config.firebase.project_id, None);
        assert_eq!(config.storage.max_upload_size, DEFAULT_MAX_UPLOAD_SIZE);
        assert!(!config.app.debug);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_lists_flags_and_firebase_project() {
        clear_env();
        std::env::set_var("ENVIRONMENT", "production");
        std::env::set_var("SECRET_KEY", "prod-secret");
        std::env::set_var("BACKEND_CORS_ORIGINS", r#"["https://app.campuscrush.app"]"#);
        std::env::set_var("ALLOWED_EMAIL_DOMAINS", "@Uni.edu,college.edu");
        std::env::set_var("FIREBASE_SERVICE_ACCOUNT", r#"{"project_id": "crush-prod"}"#);
        std::env::set_var("DEBUG", "t");
        std::env::set_var("BASE_URL", "https://api.campuscrush.app/");

        let config = Config::from_env().unwrap();
        assert!(config.is_production());
        assert_eq!(config.cors.allowed_origins, vec!["https://app.campuscrush.app"]);
        assert_eq!(
            config.auth.allowed_email_domains,
            vec!["uni.edu".to_string(), "college.edu".to_string()]
        );
        assert_eq!(config.firebase.project_id.as_deref(), Some("crush-prod"));
        assert!(config.firebase.service_account_env_present);
        assert!(config.app.debug);
        assert_eq!(config.app.base_url, "https://api.campuscrush.app");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_rejects_unsupported_algorithm() {
        clear_env();
        std::env::set_var("ENVIRONMENT", "development");
        std::env::set_var("ALGORITHM", "RS256");

        assert!(Config::from_env().is_err());

        clear_env();
    }
}
