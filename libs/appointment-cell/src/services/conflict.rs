// libs/appointment-cell/src/services/conflict.rs
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentError, AppointmentStatus, TimeSlot};

/// Read-side conflict detection for the booking workflow.
///
/// This check alone cannot close the race between two concurrent bookings;
/// the partial unique index on (doctor_id, date, time_slot) for scheduled
/// rows is the arbiter. The lookup exists to fail the common case early
/// without attempting a write.
pub struct SlotConflictService {
    store: Arc<SupabaseClient>,
}

impl SlotConflictService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        Self { store }
    }

    pub async fn slot_taken(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time_slot: TimeSlot,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking slot {} on {} for doctor {}",
            time_slot, date, doctor_id
        );

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&date=eq.{}&time_slot=eq.{}&status=eq.{}&limit=1",
            doctor_id,
            date,
            urlencoding::encode(time_slot.as_str()),
            AppointmentStatus::Scheduled
        );

        let existing: Vec<Value> = self
            .store
            .select(&path)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(!existing.is_empty())
    }
}
