use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use notification_cell::models::{NewNotification, NotificationType};
use notification_cell::services::NotificationService;
use profile_cell::services::ProfileService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{AccessError, AuthContext, UserRole};
use shared_models::time::TimeOfDay;

use crate::models::{
    Appointment, AppointmentDetails, AppointmentError, AppointmentStatus, BookAppointmentRequest,
};
use crate::services::slots::SlotLedger;

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    slots: SlotLedger,
    profiles: ProfileService,
    notifications: NotificationService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            slots: SlotLedger::new(Arc::clone(&supabase)),
            supabase,
            profiles: ProfileService::new(config),
            notifications: NotificationService::new(config),
        }
    }

    /// Records a pending appointment for the caller, then reserves its slot.
    /// The appointment row comes first because the slot references it.
    pub async fn book_appointment(
        &self,
        ctx: &AuthContext,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let identity = ctx.require_identity()?;
        let token = Some(identity.token.as_str());

        let time: TimeOfDay = request
            .appointment_time
            .parse()
            .map_err(|_| AppointmentError::InvalidTime(request.appointment_time.clone()))?;

        let date = request.appointment_date;
        let now = Utc::now().to_rfc3339();
        let row = json!({
            "id": Uuid::new_v4(),
            "patient_id": identity.user_id,
            "doctor_id": request.doctor_id,
            "appointment_date": date,
            "appointment_time": time,
            "visit_type": request.visit_type,
            "status": AppointmentStatus::Pending,
            "notes": request.notes,
            "attachments": request.attachments,
            "created_at": now,
            "updated_at": now,
        });

        let appointment: Appointment = self.supabase.insert("appointments", row, token).await?;

        if let Err(e) = self
            .slots
            .reserve(appointment.doctor_id, date, time, appointment.id, token)
            .await
        {
            debug!("Withdrawing appointment {}: {}", appointment.id, e);
            self.withdraw(appointment.id, token).await;
            return Err(e);
        }

        let notification = NewNotification::new(
            appointment.doctor_id,
            NotificationType::AppointmentRequest,
            "New Appointment Request",
            format!("You have a new appointment request for {} at {}", date, time),
        )
        .for_appointment(appointment.id);

        if let Err(e) = self.notifications.notify(notification, token).await {
            warn!("Failed to notify doctor {} of appointment {}: {}", appointment.doctor_id, appointment.id, e);
        }

        info!(
            "Patient {} booked appointment {} with doctor {} on {} at {}",
            identity.user_id, appointment.id, appointment.doctor_id, date, time
        );
        Ok(appointment)
    }

    pub async fn get_my_appointments(
        &self,
        ctx: &AuthContext,
    ) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        let Some(identity) = ctx.identity() else {
            return Ok(Vec::new());
        };
        let index = match identity.role {
            Some(UserRole::Doctor) => "doctor_id",
            Some(UserRole::Patient) => "patient_id",
            None => return Ok(Vec::new()),
        };

        let path = format!(
            "/rest/v1/appointments?{}=eq.{}&order=created_at.desc",
            index, identity.user_id
        );
        let appointments: Vec<Appointment> = self.supabase.select(&path, Some(&identity.token)).await?;

        self.with_counterparts(appointments, identity.role, Some(&identity.token)).await
    }

    /// The calling doctor's appointments for the current UTC date.
    pub async fn get_today_appointments(
        &self,
        ctx: &AuthContext,
    ) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        let Some(identity) = ctx.identity() else {
            return Ok(Vec::new());
        };
        if identity.role != Some(UserRole::Doctor) {
            return Ok(Vec::new());
        }

        let today = Utc::now().date_naive();
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&order=appointment_time.asc",
            identity.user_id, today
        );
        let appointments: Vec<Appointment> = self.supabase.select(&path, Some(&identity.token)).await?;
        debug!("Doctor {} has {} appointments today", identity.user_id, appointments.len());

        self.with_counterparts(appointments, identity.role, Some(&identity.token)).await
    }

    pub async fn get_appointment(
        &self,
        ctx: &AuthContext,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let identity = ctx.require_identity()?;
        let appointment = self.find_appointment(appointment_id, Some(&identity.token)).await?;

        if !appointment.is_participant(identity.user_id) {
            return Err(AccessError::Forbidden("Unauthorized".to_string()).into());
        }
        Ok(appointment)
    }

    async fn withdraw(&self, appointment_id: Uuid, auth_token: Option<&str>) {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        if let Err(e) = self.supabase.delete::<Appointment>(&path, auth_token).await {
            warn!("Failed to withdraw appointment {}: {}", appointment_id, e);
        }
    }

    pub async fn find_appointment(
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

    async fn with_counterparts(
        &self,
        appointments: Vec<Appointment>,
        viewer: Option<UserRole>,
        auth_token: Option<&str>,
    ) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        try_join_all(appointments.into_iter().map(|appointment| async move {
            let details = match viewer {
                Some(UserRole::Doctor) => AppointmentDetails {
                    patient: self.profiles.find_user_profile(appointment.patient_id, auth_token).await?,
                    doctor: None,
                    appointment,
                },
                _ => AppointmentDetails {
                    doctor: self.profiles.find_user_profile(appointment.doctor_id, auth_token).await?,
                    patient: None,
                    appointment,
                },
            };
            Ok::<_, AppointmentError>(details)
        }))
        .await
    }
}
