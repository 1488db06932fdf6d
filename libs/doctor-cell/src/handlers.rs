use std::sync::Arc;

use axum::{extract::State, Json};

use shared_models::error::AppError;
use shared_models::user::UserProfile;
use shared_state::AppState;

use crate::services::directory::DoctorDirectoryService;

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let directory = DoctorDirectoryService::new(Arc::clone(&state.store));

    let doctors = directory
        .list_doctors()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if doctors.is_empty() {
        return Err(AppError::NotFound("No doctors found.".to_string()));
    }

    Ok(Json(doctors))
}
