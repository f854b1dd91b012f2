pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;
use std::time::Duration;
use actix_cors::Cors;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use auth::AuthService;
pub use db::{Account, AccountCategory, AccountProjection, AccountStore, DbOperations, MemoryAccountStore};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Connects to PostgreSQL, installs the schema and wires the services.
    pub async fn new(config: Settings) -> Result<(Self, DbOperations)> {
        let db = DbOperations::new_with_options(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(config.database.acquire_timeout_secs),
        )
        .await?;
        db.migrate().await?;

        let state = Self::with_store(config, Arc::new(db.clone()));
        Ok((state, db))
    }

    pub fn with_store(config: Settings, store: Arc<dyn AccountStore>) -> Self {
        let auth_service = AuthService::from_config(store, &config.auth);
        Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
        }
    }
}

/// Registers every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Unparseable bodies get the same JSON error shape as every other failure.
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid request body: {}", err)).into()
    });

    cfg.app_data(json_config)
        .route("/health", web::get().to(health_check))
        .service(
            web::scope("/api")
                .route("/register", web::post().to(auth::handlers::register))
                .route("/login", web::post().to(auth::handlers::login))
                .route("/user", web::get().to(auth::handlers::current_user)),
        );
}

/// Builds the CORS policy from settings.
pub fn cors(config: &crate::config::CorsConfig) -> Cors {
    if !config.enabled {
        return Cors::default();
    }

    let cors = if config.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
    } else {
        config
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
            ])
    };

    cors.max_age(config.max_age as usize)
}
