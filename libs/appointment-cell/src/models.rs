// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::user::UserProfile;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// Bookable slots of the clinic day, in day order. Wire values are the
/// labels the booking form submits, so `Ord` must come from declaration
/// order rather than the strings themselves ("02:00 PM" sorts before
/// "09:00 AM" lexicographically).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "09:00 AM")]
    NineAm,
    #[serde(rename = "11:00 AM")]
    ElevenAm,
    #[serde(rename = "02:00 PM")]
    TwoPm,
    #[serde(rename = "04:00 PM")]
    FourPm,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 4] = [
        TimeSlot::NineAm,
        TimeSlot::ElevenAm,
        TimeSlot::TwoPm,
        TimeSlot::FourPm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::NineAm => "09:00 AM",
            TimeSlot::ElevenAm => "11:00 AM",
            TimeSlot::TwoPm => "02:00 PM",
            TimeSlot::FourPm => "04:00 PM",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeSlot,
}

/// Listing entry: the appointment plus the other party's public profile.
/// Patients see the doctor, doctors see the patient.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub counterpart: UserProfile,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("This doctor is already booked for the selected time slot.")]
    SlotTaken,

    #[error("Appointment not found")]
    NotFound,

    #[error("Not authorized to cancel this appointment")]
    Unauthorized,

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Database error: {0}")]
    Database(String),
}
