use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::models::{AppointmentError, AppointmentStatus};
use profile_cell::models::{ProfileError, UserProfile};
use shared_database::DatabaseError;
use shared_models::auth::AccessError;
use shared_models::error::AppError;

use crate::chart::DentalChart;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VitalSigns {
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<u32>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_id: Uuid,
    pub session_date: NaiveDate,
    pub diagnosis: String,
    pub treatment: String,
    pub prescription: Option<String>,
    pub doctor_notes: String,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub teeth_chart: Option<DentalChart>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub vital_signs: Option<VitalSigns>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MedicalRecordWithDoctor {
    #[serde(flatten)]
    pub record: MedicalRecord,
    pub doctor: Option<UserProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMedicalRecordRequest {
    pub appointment_id: Uuid,
    pub diagnosis: String,
    pub treatment: String,
    pub prescription: Option<String>,
    #[serde(default)]
    pub doctor_notes: String,
    #[serde(default)]
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Untyped so bad tooth keys surface as validation errors.
    pub teeth_chart: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub vital_signs: Option<VitalSigns>,
}

#[derive(Error, Debug)]
pub enum MedicalRecordError {
    #[error("Appointment is {0}; records can only be added to confirmed or completed visits")]
    AppointmentNotReady(AppointmentStatus),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<MedicalRecordError> for AppError {
    fn from(err: MedicalRecordError) -> Self {
        match err {
            MedicalRecordError::AppointmentNotReady(_) => AppError::BadRequest(err.to_string()),
            MedicalRecordError::Validation(msg) => AppError::ValidationError(msg),
            MedicalRecordError::Access(access) => access.into(),
            MedicalRecordError::Appointment(appointment) => appointment.into(),
            MedicalRecordError::Profile(profile) => profile.into(),
            MedicalRecordError::Database(db) => db.into(),
        }
    }
}
