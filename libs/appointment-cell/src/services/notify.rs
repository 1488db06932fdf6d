// libs/appointment-cell/src/services/notify.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use notification_cell::MailerClient;
use shared_database::supabase::{StoreError, SupabaseClient};
use shared_models::user::UserProfile;

use crate::models::{Appointment, TimeSlot};

/// Dual confirmation dispatch for a freshly booked appointment.
///
/// Everything here runs on a detached task after the booking response has
/// been emitted. Nothing in this service may mutate the appointment or
/// influence the HTTP outcome; every failure is absorbed and logged.
pub struct ConfirmationDispatchService {
    store: Arc<SupabaseClient>,
    mailer: Arc<MailerClient>,
}

impl ConfirmationDispatchService {
    pub fn new(store: Arc<SupabaseClient>, mailer: Arc<MailerClient>) -> Self {
        Self { store, mailer }
    }

    pub async fn dispatch_booking_confirmations(
        &self,
        appointment: &Appointment,
        patient_name: &str,
        patient_email: &str,
    ) {
        let (doctor_name, doctor_email) = match self.fetch_doctor(appointment.doctor_id).await {
            Ok(Some(doctor)) => doctor,
            Ok(None) => {
                warn!(
                    "Doctor {} not found, skipping confirmation emails for appointment {}",
                    appointment.doctor_id, appointment.id
                );
                return;
            }
            Err(e) => {
                warn!(
                    "Doctor lookup failed, skipping confirmation emails for appointment {}: {}",
                    appointment.id, e
                );
                return;
            }
        };

        if doctor_email.is_empty() {
            warn!(
                "Doctor {} has no email, skipping confirmation emails for appointment {}",
                appointment.doctor_id, appointment.id
            );
            return;
        }

        // The two sends are independent: a rejected patient email must not
        // keep the doctor from being notified, and vice versa.
        let (subject, body) = patient_confirmation(
            patient_name,
            &doctor_name,
            appointment.date,
            appointment.time_slot,
        );
        if let Err(e) = self.mailer.send(patient_email, &subject, &body).await {
            warn!(
                "Patient confirmation email for appointment {} failed: {}",
                appointment.id, e
            );
        }

        let (subject, body) = doctor_notification(
            &doctor_name,
            patient_name,
            appointment.date,
            appointment.time_slot,
        );
        if let Err(e) = self.mailer.send(&doctor_email, &subject, &body).await {
            warn!(
                "Doctor notification email for appointment {} failed: {}",
                appointment.id, e
            );
        }

        info!(
            "Background emails dispatched for booking {}",
            appointment.id
        );
    }

    async fn fetch_doctor(&self, doctor_id: Uuid) -> Result<Option<(String, String)>, StoreError> {
        let path = format!(
            "/rest/v1/users?id=eq.{}&select=id,name,email,role,specialization&limit=1",
            doctor_id
        );
        let profiles: Vec<UserProfile> = self.store.select(&path).await?;

        Ok(profiles.into_iter().next().and_then(|profile| match profile {
            UserProfile::Doctor { name, email, .. } => Some((name, email)),
            UserProfile::Patient { .. } => None,
        }))
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn patient_confirmation(
    patient_name: &str,
    doctor_name: &str,
    date: NaiveDate,
    time_slot: TimeSlot,
) -> (String, String) {
    let subject = "Appointment Confirmed - HealthSync".to_string();
    let body = format!(
        "Hello {},\n\n\
         Your appointment with {} has been successfully scheduled.\n\n\
         Details:\n\
         Date: {}\n\
         Time: {}\n\n\
         Best regards,\n\
         HealthSync Hospital Team",
        patient_name,
        doctor_name,
        format_date(date),
        time_slot
    );

    (subject, body)
}

fn doctor_notification(
    doctor_name: &str,
    patient_name: &str,
    date: NaiveDate,
    time_slot: TimeSlot,
) -> (String, String) {
    let subject = "New Appointment Scheduled - HealthSync".to_string();
    let body = format!(
        "Hello {},\n\n\
         A new appointment has been scheduled with you.\n\
         Patient Name: {}\n\
         Date: {}\n\
         Time: {}\n\n\
         Best regards,\n\
         HealthSync System Notification",
        doctor_name,
        patient_name,
        format_date(date),
        time_slot
    );

    (subject, body)
}
