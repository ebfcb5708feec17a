use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use notification_cell::models::{NewNotification, NotificationType};
use notification_cell::services::NotificationService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::AuthContext;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::slots::SlotLedger;

/// Statuses reachable from `current` in one step.
pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        AppointmentStatus::Pending => &[AppointmentStatus::Confirmed, AppointmentStatus::Rejected],
        AppointmentStatus::Confirmed => &[
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ],
        // Terminal states
        AppointmentStatus::Rejected
        | AppointmentStatus::Completed
        | AppointmentStatus::Cancelled
        | AppointmentStatus::NoShow => &[],
    }
}

pub fn validate_status_transition(
    current: AppointmentStatus,
    next: AppointmentStatus,
) -> Result<(), AppointmentError> {
    if !valid_transitions(current).contains(&next) {
        warn!("Invalid status transition attempted: {} -> {}", current, next);
        return Err(AppointmentError::InvalidStatusTransition { from: current, to: next });
    }
    Ok(())
}

pub struct AppointmentLifecycleService {
    supabase: Arc<SupabaseClient>,
    slots: SlotLedger,
    notifications: NotificationService,
}

impl AppointmentLifecycleService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            slots: SlotLedger::new(Arc::clone(&supabase)),
            supabase,
            notifications: NotificationService::new(config),
        }
    }

    /// Doctor-driven transitions. Completion only happens through
    /// [`complete_appointment`](Self::complete_appointment).
    pub async fn update_appointment_status(
        &self,
        ctx: &AuthContext,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let identity = ctx.require_identity()?;
        let token = Some(identity.token.as_str());

        if status == AppointmentStatus::Completed {
            return Err(AppointmentError::CompletionRequiresRecord);
        }

        let appointment = self.find(appointment_id, token).await?;
        ctx.ensure_is(appointment.doctor_id)?;
        validate_status_transition(appointment.status, status)?;

        let updated = self.transition(&appointment, status, token).await?;

        match status {
            AppointmentStatus::Rejected | AppointmentStatus::Cancelled => {
                self.slots
                    .release(
                        appointment.doctor_id,
                        appointment.appointment_date,
                        appointment.appointment_time,
                        appointment.id,
                        token,
                    )
                    .await?;
                self.notify_patient(&updated, token).await;
            }
            AppointmentStatus::Confirmed => self.notify_patient(&updated, token).await,
            _ => debug!("No side effects for {} on appointment {}", status, appointment.id),
        }

        info!("Appointment {} moved {} -> {}", appointment.id, appointment.status, status);
        Ok(updated)
    }

    /// Marks a confirmed appointment completed; already-completed ones pass through.
    pub async fn complete_appointment(
        &self,
        appointment: &Appointment,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        if appointment.status == AppointmentStatus::Completed {
            return Ok(appointment.clone());
        }
        validate_status_transition(appointment.status, AppointmentStatus::Completed)?;
        self.transition(appointment, AppointmentStatus::Completed, auth_token).await
    }

    pub async fn find(
        &self,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        self.supabase
            .select_one(&path, auth_token)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    /// Conditional on the status we read, so a concurrent change is not overwritten.
    async fn transition(
        &self,
        appointment: &Appointment,
        status: AppointmentStatus,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            appointment.id, appointment.status
        );
        let changes = json!({
            "status": status,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut rows: Vec<Appointment> = self.supabase.update(&path, changes, auth_token).await?;
        rows.pop().ok_or(AppointmentError::InvalidStatusTransition {
            from: appointment.status,
            to: status,
        })
    }

    async fn notify_patient(&self, appointment: &Appointment, auth_token: Option<&str>) {
        let (notification_type, message) = match appointment.status {
            AppointmentStatus::Confirmed => (
                NotificationType::AppointmentConfirmed,
                format!(
                    "Your appointment for {} at {} has been confirmed",
                    appointment.appointment_date, appointment.appointment_time
                ),
            ),
            AppointmentStatus::Rejected => (
                NotificationType::AppointmentRejected,
                format!(
                    "Your appointment request for {} at {} has been rejected",
                    appointment.appointment_date, appointment.appointment_time
                ),
            ),
            AppointmentStatus::Cancelled => (
                NotificationType::AppointmentCancelled,
                format!(
                    "Your appointment for {} at {} has been cancelled",
                    appointment.appointment_date, appointment.appointment_time
                ),
            ),
            _ => return,
        };

        let notification = NewNotification::new(
            appointment.patient_id,
            notification_type,
            "Appointment Update",
            message,
        )
        .for_appointment(appointment.id);

        if let Err(e) = self.notifications.notify(notification, auth_token).await {
            warn!("Failed to notify patient {} about appointment {}: {}", appointment.patient_id, appointment.id, e);
        }
    }
}
