use chrono::Utc;
use futures::future::try_join_all;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use appointment_cell::models::AppointmentStatus;
use appointment_cell::services::AppointmentLifecycleService;
use notification_cell::models::{NewNotification, NotificationType};
use notification_cell::services::NotificationService;
use profile_cell::services::ProfileService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{AccessError, AuthContext, UserRole};

use crate::chart::DentalChart;
use crate::models::{
    CreateMedicalRecordRequest, MedicalRecord, MedicalRecordError, MedicalRecordWithDoctor,
};

pub struct MedicalRecordService {
    supabase: SupabaseClient,
    appointments: AppointmentLifecycleService,
    profiles: ProfileService,
    notifications: NotificationService,
}

impl MedicalRecordService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            appointments: AppointmentLifecycleService::new(config),
            profiles: ProfileService::new(config),
            notifications: NotificationService::new(config),
        }
    }

    /// Records the visit outcome and completes the appointment.
    pub async fn create_medical_record(
        &self,
        ctx: &AuthContext,
        request: CreateMedicalRecordRequest,
    ) -> Result<MedicalRecord, MedicalRecordError> {
        let identity = ctx.require_role(UserRole::Doctor, "create medical records")?;
        let token = Some(identity.token.as_str());

        let teeth_chart = request
            .teeth_chart
            .as_ref()
            .map(|raw| DentalChart::from_entries(raw.iter().map(|(k, v)| (k.as_str(), v.as_str()))))
            .transpose()
            .map_err(MedicalRecordError::Validation)?;

        if request.diagnosis.trim().is_empty() {
            return Err(MedicalRecordError::Validation("Diagnosis is required".to_string()));
        }

        let appointment = self.appointments.find(request.appointment_id, token).await?;
        ctx.ensure_is(appointment.doctor_id)?;

        if !matches!(
            appointment.status,
            AppointmentStatus::Confirmed | AppointmentStatus::Completed
        ) {
            return Err(MedicalRecordError::AppointmentNotReady(appointment.status));
        }

        let row = json!({
            "patient_id": appointment.patient_id,
            "doctor_id": identity.user_id,
            "appointment_id": appointment.id,
            "session_date": Utc::now().date_naive(),
            "diagnosis": request.diagnosis,
            "treatment": request.treatment,
            "prescription": request.prescription,
            "doctor_notes": request.doctor_notes,
            "follow_up_required": request.follow_up_required,
            "follow_up_date": request.follow_up_date,
            "attachments": request.attachments,
            "teeth_chart": teeth_chart,
            "symptoms": request.symptoms,
            "vital_signs": request.vital_signs,
            "created_at": Utc::now().to_rfc3339(),
        });

        let record: MedicalRecord = self.supabase.insert("medical_records", row, token).await?;

        self.appointments.complete_appointment(&appointment, token).await?;

        let notification = NewNotification::new(
            appointment.patient_id,
            NotificationType::SessionSummary,
            "Medical Record Created",
            "Your medical record has been updated after your recent visit.",
        )
        .for_appointment(appointment.id);

        if let Err(e) = self.notifications.notify(notification, token).await {
            warn!("Failed to send session summary for record {}: {}", record.id, e);
        }

        info!("Doctor {} recorded session {} for appointment {}", identity.user_id, record.id, appointment.id);
        Ok(record)
    }

    /// Doctors may read any patient's history; patients only their own.
    pub async fn get_patient_medical_records(
        &self,
        ctx: &AuthContext,
        patient_id: Uuid,
    ) -> Result<Vec<MedicalRecordWithDoctor>, MedicalRecordError> {
        let Some(identity) = ctx.identity() else {
            return Ok(Vec::new());
        };
        match identity.role {
            None => return Ok(Vec::new()),
            Some(UserRole::Patient) if identity.user_id != patient_id => {
                return Err(AccessError::Forbidden("Unauthorized".to_string()).into());
            }
            Some(_) => {}
        }
        let token = Some(identity.token.as_str());

        let path = format!(
            "/rest/v1/medical_records?patient_id=eq.{}&order=created_at.desc",
            patient_id
        );
        let records: Vec<MedicalRecord> = self.supabase.select(&path, token).await?;

        try_join_all(records.into_iter().map(|record| async move {
            let doctor = self.profiles.find_user_profile(record.doctor_id, token).await?;
            Ok::<_, MedicalRecordError>(MedicalRecordWithDoctor { record, doctor })
        }))
        .await
    }

    pub async fn get_appointment_records(
        &self,
        ctx: &AuthContext,
        appointment_id: Uuid,
    ) -> Result<Vec<MedicalRecord>, MedicalRecordError> {
        let identity = ctx.require_identity()?;
        let token = Some(identity.token.as_str());

        let appointment = self.appointments.find(appointment_id, token).await?;
        if !appointment.is_participant(identity.user_id) {
            return Err(AccessError::Forbidden("Unauthorized".to_string()).into());
        }

        let path = format!(
            "/rest/v1/medical_records?appointment_id=eq.{}&order=created_at.desc",
            appointment_id
        );
        Ok(self.supabase.select(&path, token).await?)
    }
}
