// libs/appointment-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::supabase::{StoreError, SupabaseClient};
use shared_models::auth::AuthUser;
use shared_models::user::{UserProfile, UserRole};

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentView, BookAppointmentRequest,
};
use crate::services::conflict::SlotConflictService;

pub struct BookingService {
    store: Arc<SupabaseClient>,
    conflict_service: SlotConflictService,
}

impl BookingService {
    pub fn new(store: Arc<SupabaseClient>) -> Self {
        let conflict_service = SlotConflictService::new(Arc::clone(&store));

        Self {
            store,
            conflict_service,
        }
    }

    /// Book a slot for a patient. The write is the arbiter: a concurrent
    /// booking that wins the slot between the conflict check and the insert
    /// surfaces as a unique violation and maps to the same conflict error.
    pub async fn book_appointment(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {} on {} at {}",
            patient_id, request.doctor_id, request.date, request.time_slot
        );

        self.verify_doctor(request.doctor_id).await?;

        if self
            .conflict_service
            .slot_taken(request.doctor_id, request.date, request.time_slot)
            .await?
        {
            warn!(
                "Slot {} on {} already booked for doctor {}",
                request.time_slot, request.date, request.doctor_id
            );
            return Err(AppointmentError::SlotTaken);
        }

        let now = Utc::now();
        let row = json!({
            "patient_id": patient_id,
            "doctor_id": request.doctor_id,
            "date": request.date,
            "time_slot": request.time_slot,
            "status": AppointmentStatus::Scheduled,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let appointment: Appointment = self
            .store
            .insert("/rest/v1/appointments", row)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => {
                    warn!(
                        "Slot {} on {} lost to a concurrent booking for doctor {}",
                        request.time_slot, request.date, request.doctor_id
                    );
                    AppointmentError::SlotTaken
                }
                other => AppointmentError::Database(other.to_string()),
            })?;

        info!(
            "Appointment {} booked for patient {} with doctor {}",
            appointment.id, patient_id, request.doctor_id
        );
        Ok(appointment)
    }

    /// Role-scoped listing: doctors see their schedule, patients their own
    /// bookings. Only scheduled appointments are listed; each entry carries
    /// the counterpart's public profile, ordered by date then slot.
    pub async fn list_appointments(
        &self,
        user: &AuthUser,
    ) -> Result<Vec<AppointmentView>, AppointmentError> {
        debug!("Listing appointments for {} ({})", user.id, user.role);

        let owner_filter = match user.role {
            UserRole::Doctor => format!("doctor_id=eq.{}", user.id),
            UserRole::Patient => format!("patient_id=eq.{}", user.id),
        };

        let path = format!(
            "/rest/v1/appointments?{}&status=eq.{}&order=date.asc",
            owner_filter,
            AppointmentStatus::Scheduled
        );

        let mut appointments: Vec<Appointment> = self
            .store
            .select(&path)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        // Slot order is time-of-day order, which the stored labels do not
        // sort to, so the secondary key is applied here.
        appointments.sort_by(|a, b| a.date.cmp(&b.date).then(a.time_slot.cmp(&b.time_slot)));

        if appointments.is_empty() {
            return Ok(Vec::new());
        }

        let counterparts = self.fetch_counterparts(&appointments, user.role).await?;

        let mut views = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            let counterpart_id = match user.role {
                UserRole::Doctor => appointment.patient_id,
                UserRole::Patient => appointment.doctor_id,
            };

            let counterpart = counterparts.get(&counterpart_id).cloned().ok_or_else(|| {
                AppointmentError::Database(format!(
                    "user {} referenced by appointment {} is missing",
                    counterpart_id, appointment.id
                ))
            })?;

            views.push(AppointmentView {
                appointment,
                counterpart,
            });
        }

        Ok(views)
    }

    /// Cancel an appointment on behalf of one of its participants. The row
    /// stays in the store with status cancelled; listings filter it out.
    pub async fn cancel_appointment(
        &self,
        requester: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment {}", appointment_id);

        let appointment = self.get_appointment(appointment_id).await?;

        if appointment.patient_id != requester && appointment.doctor_id != requester {
            warn!(
                "User {} attempted to cancel appointment {} they are not part of",
                requester, appointment_id
            );
            return Err(AppointmentError::Unauthorized);
        }

        if appointment.status == AppointmentStatus::Cancelled {
            return Err(AppointmentError::AlreadyCancelled);
        }

        let patch = json!({
            "status": AppointmentStatus::Cancelled,
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let updated: Vec<Appointment> = self
            .store
            .update(&path, patch)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let cancelled = updated
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database("Failed to update appointment".to_string()))?;

        info!("Appointment {} cancelled by {}", appointment_id, requester);
        Ok(cancelled)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Appointment> = self
            .store
            .select(&path)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        result.into_iter().next().ok_or(AppointmentError::NotFound)
    }

    async fn verify_doctor(&self, doctor_id: Uuid) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/users?id=eq.{}&role=eq.Doctor&select=id&limit=1",
            doctor_id
        );
        let result: Vec<Value> = self
            .store
            .select(&path)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DoctorNotFound);
        }

        Ok(())
    }

    async fn fetch_counterparts(
        &self,
        appointments: &[Appointment],
        requester_role: UserRole,
    ) -> Result<HashMap<Uuid, UserProfile>, AppointmentError> {
        let mut ids: Vec<String> = appointments
            .iter()
            .map(|appointment| match requester_role {
                UserRole::Doctor => appointment.patient_id.to_string(),
                UserRole::Patient => appointment.doctor_id.to_string(),
            })
            .collect();
        ids.sort();
        ids.dedup();

        let path = format!(
            "/rest/v1/users?id=in.({})&select=id,name,email,role,specialization",
            ids.join(",")
        );

        let profiles: Vec<UserProfile> = self
            .store
            .select(&path)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(profiles
            .into_iter()
            .map(|profile| (profile.id(), profile))
            .collect())
    }
}
