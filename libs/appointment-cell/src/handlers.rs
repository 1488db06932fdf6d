// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::AuthUser;
use shared_models::error::AppError;
use shared_state::AppState;

use crate::models::{Appointment, AppointmentError, AppointmentView, BookAppointmentRequest};
use crate::services::booking::BookingService;
use crate::services::notify::ConfirmationDispatchService;

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::SlotTaken | AppointmentError::AlreadyCancelled => {
            AppError::BadRequest(e.to_string())
        }
        AppointmentError::NotFound | AppointmentError::DoctorNotFound => {
            AppError::NotFound(e.to_string())
        }
        AppointmentError::Unauthorized => AppError::Auth(e.to_string()),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

/// Book a slot for the authenticated patient. The 201 is emitted as soon as
/// the insert lands; confirmation emails run on their own task and their
/// outcome never reaches this response.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let booking_service = BookingService::new(Arc::clone(&state.store));

    let appointment = booking_service
        .book_appointment(user.id, request)
        .await
        .map_err(map_appointment_error)?;

    let dispatch_service =
        ConfirmationDispatchService::new(Arc::clone(&state.store), Arc::clone(&state.mailer));
    let booked = appointment.clone();
    tokio::spawn(async move {
        dispatch_service
            .dispatch_booking_confirmations(&booked, &user.name, &user.email)
            .await;
    });

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn list_my_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<AppointmentView>>, AppError> {
    let booking_service = BookingService::new(Arc::clone(&state.store));

    let appointments = booking_service
        .list_appointments(&user)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(Arc::clone(&state.store));

    booking_service
        .cancel_appointment(user.id, appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment successfully cancelled."
    })))
}
