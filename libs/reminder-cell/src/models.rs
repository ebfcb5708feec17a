use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use profile_cell::models::{ProfileError, UserProfile};
use shared_database::DatabaseError;
use shared_models::auth::AccessError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    AppointmentFollowup,
    Medication,
    Checkup,
    Cleaning,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecurringInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringInterval {
    /// Month arithmetic clamps to the last valid day (Jan 31 -> Feb 28).
    pub fn next_after(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            RecurringInterval::Daily => date.checked_add_signed(Duration::days(1)),
            RecurringInterval::Weekly => date.checked_add_signed(Duration::weeks(1)),
            RecurringInterval::Monthly => date.checked_add_months(Months::new(1)),
            RecurringInterval::Yearly => date.checked_add_months(Months::new(12)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub title: String,
    pub message: String,
    pub reminder_date: NaiveDate,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
    pub status: ReminderStatus,
    /// Date this reminder was last delivered by a dispatch run.
    #[serde(default)]
    pub last_sent_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderWithPatient {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub patient: Option<UserProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReminderRequest {
    pub patient_id: Uuid,
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub title: String,
    pub message: String,
    pub reminder_date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
}

impl CreateReminderRequest {
    pub fn validate(&self) -> Result<(), ReminderError> {
        if self.title.trim().is_empty() {
            return Err(ReminderError::Validation("Reminder title is required".to_string()));
        }
        if self.is_recurring && self.recurring_interval.is_none() {
            return Err(ReminderError::Validation(
                "Recurring reminders need an interval".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateReminderStatusRequest {
    pub status: ReminderStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DueRemindersQuery {
    pub date: NaiveDate,
}

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Reminder not found")]
    NotFound,

    #[error("Reminders can only be marked completed or cancelled")]
    InvalidStatus,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<ReminderError> for AppError {
    fn from(err: ReminderError) -> Self {
        match err {
            ReminderError::NotFound => AppError::NotFound(err.to_string()),
            ReminderError::InvalidStatus => AppError::BadRequest(err.to_string()),
            ReminderError::Validation(msg) => AppError::ValidationError(msg),
            ReminderError::Access(access) => access.into(),
            ReminderError::Profile(profile) => profile.into(),
            ReminderError::Database(db) => db.into(),
        }
    }
}
