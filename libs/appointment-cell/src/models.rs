use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use profile_cell::models::{ProfileError, UserProfile};
use notification_cell::models::NotificationError;
use shared_database::DatabaseError;
use shared_models::auth::AccessError;
use shared_models::error::AppError;
use shared_models::time::TimeOfDay;

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum VisitType {
    Consultation,
    Pain,
    Cleaning,
    Filling,
    Extraction,
    Checkup,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Rejected,
    Completed,
    Cancelled,
    NoShow,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Rejected => "rejected",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: TimeOfDay,
    pub visit_type: VisitType,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.patient_id == user_id || self.doctor_id == user_id
    }
}

/// An appointment with the profile of the party on the other side.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<UserProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    /// Validated as `HH:MM` by the booking service.
    pub appointment_time: String,
    pub visit_type: VisitType,
    pub notes: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slot: TimeOfDay,
    pub is_booked: bool,
    pub appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: NaiveDate,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Appointment slot not available")]
    SlotNotAvailable,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Cannot change appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointments are completed by creating a medical record")]
    CompletionRequiresRecord,

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound(err.to_string()),
            AppointmentError::SlotNotAvailable => AppError::Conflict(err.to_string()),
            AppointmentError::InvalidTime(_)
            | AppointmentError::InvalidStatusTransition { .. }
            | AppointmentError::CompletionRequiresRecord => AppError::BadRequest(err.to_string()),
            AppointmentError::Access(access) => access.into(),
            AppointmentError::Profile(profile) => profile.into(),
            AppointmentError::Notification(notification) => notification.into(),
            AppointmentError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(AppointmentStatus::NoShow).unwrap(), "no_show");
        assert_eq!(AppointmentStatus::NoShow.to_string(), "no_show");
    }

    #[test]
    fn slot_conflict_is_http_conflict() {
        assert_matches!(AppError::from(AppointmentError::SlotNotAvailable), AppError::Conflict(_));
        assert_matches!(
            AppError::from(AppointmentError::InvalidStatusTransition {
                from: AppointmentStatus::Completed,
                to: AppointmentStatus::Confirmed,
            }),
            AppError::BadRequest(msg) if msg == "Cannot change appointment from completed to confirmed"
        );
    }
}
