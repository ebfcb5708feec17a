use chrono::{DateTime, NaiveDate, Utc, Weekday, Datelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::auth::{AccessError, UserRole};
use shared_models::error::AppError;
use shared_models::time::TimeOfDay;

// ==============================================================================
// USER PROFILE
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Ar,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
    pub full_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<u32>,
    pub language: Language,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserProfileRequest {
    pub role: UserRole,
    pub full_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<u32>,
    #[serde(default)]
    pub language: Language,
}

/// Role is fixed at creation and has no field here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateUserProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

impl UpdateUserProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone_number.is_none()
            && self.email.is_none()
            && self.language.is_none()
    }
}

// ==============================================================================
// DOCTOR PROFILE
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkingDay {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub is_working: bool,
}

impl WorkingDay {
    pub fn new(start: TimeOfDay, end: TimeOfDay, is_working: bool) -> Self {
        Self { start, end, is_working }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkingHours {
    pub monday: WorkingDay,
    pub tuesday: WorkingDay,
    pub wednesday: WorkingDay,
    pub thursday: WorkingDay,
    pub friday: WorkingDay,
    pub saturday: WorkingDay,
    pub sunday: WorkingDay,
}

impl Default for WorkingHours {
    fn default() -> Self {
        let weekday = WorkingDay::new(TimeOfDay::saturating(9, 0), TimeOfDay::saturating(17, 0), true);
        let short_day = WorkingDay::new(TimeOfDay::saturating(9, 0), TimeOfDay::saturating(14, 0), true);

        Self {
            monday: weekday,
            tuesday: weekday,
            wednesday: weekday,
            thursday: weekday,
            friday: weekday,
            saturday: short_day,
            sunday: WorkingDay { is_working: false, ..short_day },
        }
    }
}

impl WorkingHours {
    pub fn for_weekday(&self, weekday: Weekday) -> &WorkingDay {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    /// Every working day must open before it closes.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let days = [
            ("monday", &self.monday),
            ("tuesday", &self.tuesday),
            ("wednesday", &self.wednesday),
            ("thursday", &self.thursday),
            ("friday", &self.friday),
            ("saturday", &self.saturday),
            ("sunday", &self.sunday),
        ];

        for (name, day) in days {
            if day.is_working && day.start >= day.end {
                return Err(ProfileError::Validation(format!(
                    "Working hours for {} must start before they end",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub working_hours: WorkingHours,
    pub is_online: bool,
    pub session_duration: u32,
    #[serde(default)]
    pub leave_days: Vec<NaiveDate>,
}

impl DoctorProfile {
    pub fn is_on_leave(&self, date: NaiveDate) -> bool {
        self.leave_days.contains(&date)
    }

    /// The day's schedule, or `None` when the doctor does not work on `date`.
    pub fn schedule_for(&self, date: NaiveDate) -> Option<&WorkingDay> {
        let day = self.working_hours.for_weekday(date.weekday());
        if !day.is_working || self.is_on_leave(date) {
            return None;
        }
        Some(day)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorWithProfile {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub doctor_profile: Option<DoctorProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDoctorStatusRequest {
    pub is_online: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateDoctorScheduleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<WorkingHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave_days: Option<Vec<NaiveDate>>,
}

impl UpdateDoctorScheduleRequest {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.session_duration == Some(0) {
            return Err(ProfileError::Validation(
                "Session duration must be greater than zero".to_string(),
            ));
        }
        if let Some(hours) = &self.working_hours {
            hours.validate()?;
        }
        Ok(())
    }
}

// ==============================================================================
// PATIENT PROFILE
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MedicalHistory {
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub chronic_diseases: Vec<String>,
    #[serde(default)]
    pub special_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub preferred_doctor_id: Option<Uuid>,
    #[serde(default)]
    pub medical_history: MedicalHistory,
    pub emergency_contact: Option<EmergencyContact>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateMedicalHistoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<MedicalHistory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_doctor_id: Option<Uuid>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("User profile not found")]
    ProfileNotFound,

    #[error("Doctor profile not found")]
    DoctorProfileNotFound,

    #[error("Patient profile not found")]
    PatientProfileNotFound,

    #[error("Profile already exists for this user")]
    AlreadyExists,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::ProfileNotFound
            | ProfileError::DoctorProfileNotFound
            | ProfileError::PatientProfileNotFound => AppError::NotFound(err.to_string()),
            ProfileError::AlreadyExists => AppError::Conflict(err.to_string()),
            ProfileError::Validation(msg) => AppError::ValidationError(msg),
            ProfileError::Access(access) => access.into(),
            ProfileError::Database(db) => db.into(),
        }
    }
}
