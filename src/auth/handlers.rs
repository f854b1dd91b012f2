use actix_web::{web, HttpRequest, HttpResponse, ResponseError, http::header};
use serde_json::json;
use tracing::{info, warn, error};

use crate::auth::service::{LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::AppState;

fn log_failure(action: &str, e: &AppError) {
    if e.status_code().is_server_error() {
        error!("{} failed: {}", action, e);
    } else {
        warn!("{} rejected: {}", action, e);
    }
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request");

    match state.auth_service.register(req.into_inner()).await {
        Ok(user) => {
            info!("Registration successful for account {}", user.id);
            Ok(HttpResponse::Created().json(json!({
                "message": "User registered successfully",
                "user": user
            })))
        }
        Err(e) => {
            log_failure("Registration", &e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request");

    match state.auth_service.login(req.into_inner()).await {
        Ok(response) => {
            info!("Login successful for account {}", response.user.id);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log_failure("Login", &e);
            Err(e)
        }
    }
}

/// Resolves the bearer token in the `Authorization` header to its account.
pub async fn current_user(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match state.auth_service.resolve(authorization).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({ "user": user }))),
        Err(e) => {
            log_failure("Identity lookup", &e);
            Err(e)
        }
    }
}
