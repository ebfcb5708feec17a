use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::auth::AccessError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    AppointmentRequest,
    AppointmentConfirmed,
    AppointmentRejected,
    AppointmentReminder,
    AppointmentCancelled,
    SessionSummary,
    InvoiceCreated,
    PaymentReceived,
    Reminder,
    LowStock,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub related_appointment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Row written by the other cells; always stored unread.
#[derive(Debug, Clone, Serialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_appointment_id: Option<Uuid>,
}

impl NewNotification {
    pub fn new(
        user_id: Uuid,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            title: title.into(),
            message: message.into(),
            related_appointment_id: None,
        }
    }

    pub fn for_appointment(mut self, appointment_id: Uuid) -> Self {
        self.related_appointment_id = Some(appointment_id);
        self
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound => AppError::NotFound(err.to_string()),
            NotificationError::Access(access) => access.into(),
            NotificationError::Database(db) => db.into(),
        }
    }
}
