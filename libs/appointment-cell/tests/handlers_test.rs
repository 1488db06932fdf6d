use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers;
use appointment_cell::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, TimeSlot,
};
use appointment_cell::services::notify::ConfirmationDispatchService;
use shared_models::error::AppError;
use shared_models::user::UserProfile;
use shared_state::AppState;
use shared_utils::test_utils::{MockStoreResponses, TestConfig, TestUser};

fn state_for(store: &MockServer, mail: &MockServer) -> Arc<AppState> {
    TestConfig::with_endpoints(&store.uri(), &mail.uri()).to_state()
}

fn booking_request(doctor_id: Uuid) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id,
        date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        time_slot: TimeSlot::NineAm,
    }
}

async fn mount_doctor_lookup(store: &MockServer, doctor: &TestUser) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor_directory_row(
                doctor.id,
                &doctor.name,
                &doctor.email,
                "General Practice",
            )
        ])))
        .mount(store)
        .await;
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[tokio::test]
async fn booking_a_free_slot_returns_created() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");

    mount_doctor_lookup(&store, &doctor).await;

    // No scheduled appointment holds the slot
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment_row(
                patient.id,
                doctor.id,
                "2025-06-01",
                "09:00 AM",
                "scheduled",
            )
        ])))
        .expect(1)
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mail)
        .await;

    let (status, Json(appointment)) = handlers::book_appointment(
        State(state_for(&store, &mail)),
        Extension(patient.to_auth_user()),
        Json(booking_request(doctor.id)),
    )
    .await
    .expect("booking should succeed");

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(appointment.patient_id, patient.id);
    assert_eq!(appointment.doctor_id, doctor.id);
    assert_eq!(appointment.time_slot, TimeSlot::NineAm);
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn booking_a_taken_slot_is_rejected_without_a_write() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("second@example.com");
    let doctor = TestUser::doctor("doctor@example.com");
    let earlier_patient = Uuid::new_v4();

    mount_doctor_lookup(&store, &doctor).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .and(query_param("date", "eq.2025-06-01"))
        .and(query_param("status", "eq.scheduled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                earlier_patient,
                doctor.id,
                "2025-06-01",
                "09:00 AM",
                "scheduled",
            )
        ])))
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&store)
        .await;

    let err = handlers::book_appointment(
        State(state_for(&store, &mail)),
        Extension(patient.to_auth_user()),
        Json(booking_request(doctor.id)),
    )
    .await
    .expect_err("second booking must conflict");

    match err {
        AppError::BadRequest(msg) => {
            assert_eq!(msg, "This doctor is already booked for the selected time slot.")
        }
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn losing_the_insert_race_maps_to_the_same_conflict_error() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("racer@example.com");
    let doctor = TestUser::doctor("doctor@example.com");

    mount_doctor_lookup(&store, &doctor).await;

    // The read sees a free slot...
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&store)
        .await;

    // ...but a concurrent booking wins the unique index first.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"uq_scheduled_slot\""
        })))
        .expect(1)
        .mount(&store)
        .await;

    let err = handlers::book_appointment(
        State(state_for(&store, &mail)),
        Extension(patient.to_auth_user()),
        Json(booking_request(doctor.id)),
    )
    .await
    .expect_err("losing insert must conflict");

    match err {
        AppError::BadRequest(msg) => {
            assert_eq!(msg, "This doctor is already booked for the selected time slot.")
        }
        other => panic!("expected BadRequest, got {:?}", other),
    }
}

#[tokio::test]
async fn booking_with_unknown_doctor_is_not_found() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&store)
        .await;

    let err = handlers::book_appointment(
        State(state_for(&store, &mail)),
        Extension(patient.to_auth_user()),
        Json(booking_request(Uuid::new_v4())),
    )
    .await
    .expect_err("unknown doctor must fail");

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn failing_mail_gateway_does_not_touch_the_response_or_the_record() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");

    mount_doctor_lookup(&store, &doctor).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment_row(
                patient.id,
                doctor.id,
                "2025-06-01",
                "09:00 AM",
                "scheduled",
            )
        ])))
        .mount(&store)
        .await;

    // The booked row must never be patched or deleted because of a mail failure
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("smtp relay down"))
        .mount(&mail)
        .await;

    let (status, _) = handlers::book_appointment(
        State(state_for(&store, &mail)),
        Extension(patient.to_auth_user()),
        Json(booking_request(doctor.id)),
    )
    .await
    .expect("booking must succeed even when mail delivery cannot");

    assert_eq!(status, StatusCode::CREATED);

    // Both sends are attempted on the detached task even though each fails.
    let mut attempts = 0;
    loop {
        let received = mail.received_requests().await.unwrap_or_default();
        if received.len() >= 2 {
            break;
        }
        attempts += 1;
        assert!(attempts < 100, "confirmation emails were never attempted");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// ==============================================================================
// CONFIRMATION DISPATCH (detached phase, driven directly)
// ==============================================================================

fn scheduled_appointment(patient_id: Uuid, doctor_id: Uuid) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id,
        doctor_id,
        date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        time_slot: TimeSlot::NineAm,
        status: AppointmentStatus::Scheduled,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn dispatch_sends_one_email_to_each_party() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");

    mount_doctor_lookup(&store, &doctor).await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({
            "to": "patient@example.com",
            "subject": "Appointment Confirmed - HealthSync"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mail)
        .await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({
            "to": "doctor@example.com",
            "subject": "New Appointment Scheduled - HealthSync"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mail)
        .await;

    let state = state_for(&store, &mail);
    let service =
        ConfirmationDispatchService::new(Arc::clone(&state.store), Arc::clone(&state.mailer));

    service
        .dispatch_booking_confirmations(
            &scheduled_appointment(patient.id, doctor.id),
            &patient.name,
            &patient.email,
        )
        .await;
}

#[tokio::test]
async fn dispatch_aborts_silently_when_the_doctor_is_missing() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&store)
        .await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mail)
        .await;

    let state = state_for(&store, &mail);
    let service =
        ConfirmationDispatchService::new(Arc::clone(&state.store), Arc::clone(&state.mailer));

    service
        .dispatch_booking_confirmations(
            &scheduled_appointment(patient.id, Uuid::new_v4()),
            &patient.name,
            &patient.email,
        )
        .await;
}

#[tokio::test]
async fn rejected_patient_email_does_not_block_the_doctor_email() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");

    mount_doctor_lookup(&store, &doctor).await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({ "to": "patient@example.com" })))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mail)
        .await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(json!({ "to": "doctor@example.com" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mail)
        .await;

    let state = state_for(&store, &mail);
    let service =
        ConfirmationDispatchService::new(Arc::clone(&state.store), Arc::clone(&state.mailer));

    service
        .dispatch_booking_confirmations(
            &scheduled_appointment(patient.id, doctor.id),
            &patient.name,
            &patient.email,
        )
        .await;
}

// ==============================================================================
// LISTING
// ==============================================================================

#[tokio::test]
async fn listing_orders_by_date_then_slot_and_enriches_the_counterpart() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");

    // Deliberately out of order; "02:00 PM" also sorts before "09:00 AM"
    // as a raw string, which the slot ordering must not reproduce.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                patient.id, doctor.id, "2025-06-02", "09:00 AM", "scheduled"
            ),
            MockStoreResponses::appointment_row(
                patient.id, doctor.id, "2025-06-01", "02:00 PM", "scheduled"
            ),
            MockStoreResponses::appointment_row(
                patient.id, doctor.id, "2025-06-01", "09:00 AM", "scheduled"
            ),
        ])))
        .mount(&store)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor_directory_row(
                doctor.id,
                &doctor.name,
                &doctor.email,
                "Cardiology",
            )
        ])))
        .mount(&store)
        .await;

    let Json(views) = handlers::list_my_appointments(
        State(state_for(&store, &mail)),
        Extension(patient.to_auth_user()),
    )
    .await
    .expect("listing should succeed");

    assert_eq!(views.len(), 3);

    let keys: Vec<(NaiveDate, TimeSlot)> = views
        .iter()
        .map(|v| (v.appointment.date, v.appointment.time_slot))
        .collect();
    assert_eq!(
        keys,
        vec![
            (NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), TimeSlot::NineAm),
            (NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), TimeSlot::TwoPm),
            (NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), TimeSlot::NineAm),
        ]
    );

    for view in &views {
        match &view.counterpart {
            UserProfile::Doctor {
                id, specialization, ..
            } => {
                assert_eq!(*id, doctor.id);
                assert_eq!(specialization, "Cardiology");
            }
            other => panic!("patient listing must show the doctor, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn listing_is_empty_for_a_patient_with_no_bookings() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&store)
        .await;

    let Json(views) = handlers::list_my_appointments(
        State(state_for(&store, &mail)),
        Extension(patient.to_auth_user()),
    )
    .await
    .expect("listing should succeed");

    assert!(views.is_empty());
}

// ==============================================================================
// CANCELLATION
// ==============================================================================

fn stored_appointment_row(
    id: Uuid,
    patient_id: Uuid,
    doctor_id: Uuid,
    status: &str,
) -> serde_json::Value {
    let mut row =
        MockStoreResponses::appointment_row(patient_id, doctor_id, "2025-06-01", "09:00 AM", status);
    row["id"] = json!(id);
    row
}

#[tokio::test]
async fn cancellation_by_a_non_participant_is_unauthorized() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let appointment_id = Uuid::new_v4();
    let stranger = TestUser::patient("stranger@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored_appointment_row(appointment_id, Uuid::new_v4(), Uuid::new_v4(), "scheduled")
        ])))
        .mount(&store)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store)
        .await;

    let err = handlers::cancel_appointment(
        State(state_for(&store, &mail)),
        Path(appointment_id),
        Extension(stranger.to_auth_user()),
    )
    .await
    .expect_err("stranger must not cancel");

    match err {
        AppError::Auth(msg) => assert_eq!(msg, "Not authorized to cancel this appointment"),
        other => panic!("expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn cancelling_a_missing_appointment_is_not_found() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let patient = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&store)
        .await;

    let err = handlers::cancel_appointment(
        State(state_for(&store, &mail)),
        Path(Uuid::new_v4()),
        Extension(patient.to_auth_user()),
    )
    .await
    .expect_err("missing appointment must 404");

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn either_participant_can_cancel() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let appointment_id = Uuid::new_v4();
    let patient = TestUser::patient("patient@example.com");
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored_appointment_row(appointment_id, patient.id, doctor_id, "scheduled")
        ])))
        .mount(&store)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(body_partial_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored_appointment_row(appointment_id, patient.id, doctor_id, "cancelled")
        ])))
        .expect(1)
        .mount(&store)
        .await;

    let Json(body) = handlers::cancel_appointment(
        State(state_for(&store, &mail)),
        Path(appointment_id),
        Extension(patient.to_auth_user()),
    )
    .await
    .expect("participant cancellation should succeed");

    assert_eq!(body["message"], "Appointment successfully cancelled.");
}

#[tokio::test]
async fn cancelling_twice_is_rejected() {
    let store = MockServer::start().await;
    let mail = MockServer::start().await;

    let appointment_id = Uuid::new_v4();
    let patient = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored_appointment_row(appointment_id, patient.id, Uuid::new_v4(), "cancelled")
        ])))
        .mount(&store)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&store)
        .await;

    let err = handlers::cancel_appointment(
        State(state_for(&store, &mail)),
        Path(appointment_id),
        Extension(patient.to_auth_user()),
    )
    .await
    .expect_err("double cancellation must fail");

    assert!(matches!(err, AppError::BadRequest(_)));
}
