use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_database::supabase::StoreError;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_models::user::{UserRecord, UserRole};
use shared_state::AppState;
use shared_utils::jwt::issue_token;

use crate::models::{AuthResponse, LoginRequest, RegisterRequest};
use crate::password::{hash_password, verify_password};

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    debug!("Registering {} as {}", request.email, request.role);

    let mut name = request.name.trim().to_string();

    // Doctors must declare a specialization, and get the "Dr." prefix if the
    // submitted name does not already carry one.
    let specialization = match request.role {
        UserRole::Doctor => {
            let specialization = request
                .specialization
                .as_deref()
                .map(str::trim)
                .unwrap_or("");

            if specialization.is_empty() {
                return Err(AppError::ValidationError(
                    "Specialization is required for doctors.".to_string(),
                ));
            }

            if !name.to_lowercase().starts_with("dr.") {
                name = format!("Dr. {}", name);
            }

            Some(specialization.to_string())
        }
        UserRole::Patient => None,
    };

    let existing_path = format!(
        "/rest/v1/users?email=eq.{}&select=id&limit=1",
        urlencoding::encode(&request.email)
    );
    let existing: Vec<Value> = state
        .store
        .select(&existing_path)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if !existing.is_empty() {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    let now = Utc::now();
    let row = json!({
        "name": name,
        "email": request.email,
        "password_hash": password_hash,
        "role": request.role,
        "specialization": specialization,
        "created_at": now.to_rfc3339(),
        "updated_at": now.to_rfc3339()
    });

    let user: UserRecord = state
        .store
        .insert("/rest/v1/users", row)
        .await
        .map_err(|e| match e {
            // The unique index on email is the arbiter for concurrent signups.
            StoreError::UniqueViolation(_) => {
                AppError::BadRequest("User already exists".to_string())
            }
            other => AppError::Database(other.to_string()),
        })?;

    let token = issue_token(
        user.id,
        &user.name,
        &user.email,
        user.role,
        &state.config.jwt_secret,
    )
    .map_err(AppError::Internal)?;

    info!("User {} registered as {}", user.id, user.role);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    debug!("Login attempt for {}", request.email);

    let path = format!(
        "/rest/v1/users?email=eq.{}&limit=1",
        urlencoding::encode(&request.email)
    );
    let users: Vec<UserRecord> = state
        .store
        .select(&path)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    let user = users
        .into_iter()
        .next()
        .ok_or_else(|| AppError::BadRequest("Invalid credentials".to_string()))?;

    let password_matches = verify_password(&request.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))?;

    if !password_matches {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let token = issue_token(
        user.id,
        &user.name,
        &user.email,
        user.role,
        &state.config.jwt_secret,
    )
    .map_err(AppError::Internal)?;

    debug!("User {} logged in", user.id);

    Ok(Json(AuthResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        token,
    }))
}

/// Echo the identity carried by the validated token.
#[axum::debug_handler]
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
    Json(user)
}
