use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use notification_cell::models::NotificationError;
use profile_cell::models::{ProfileError, UserProfile};
use shared_database::DatabaseError;
use shared_models::auth::AccessError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub items: Vec<InvoiceItem>,
    pub subtotal: f64,
    pub tax: f64,
    #[serde(default)]
    pub discount: f64,
    pub total: f64,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `INV-<millis>-<4 hex>`; the suffix separates invoices issued within the
/// same millisecond.
pub fn invoice_number(issued_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("INV-{}-{}", issued_at.timestamp_millis(), suffix[..4].to_uppercase())
}

impl Invoice {
    /// A pending invoice past its due date reads as overdue.
    pub fn effective_status(&self, today: NaiveDate) -> InvoiceStatus {
        match self.status {
            InvoiceStatus::Pending if self.due_date < today => InvoiceStatus::Overdue,
            status => status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithParty {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub other_user: Option<UserProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceRequest {
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub items: Vec<InvoiceItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: Option<f64>,
    pub total: f64,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

impl CreateInvoiceRequest {
    pub fn validate(&self) -> Result<(), BillingError> {
        if self.items.is_empty() {
            return Err(BillingError::Validation("Invoice must have at least one item".to_string()));
        }
        let amounts = [self.subtotal, self.tax, self.discount.unwrap_or(0.0), self.total];
        if amounts.iter().any(|amount| !amount.is_finite() || *amount < 0.0) {
            return Err(BillingError::Validation("Invoice amounts must be non-negative".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInvoiceStatusRequest {
    pub status: InvoiceStatus,
    pub payment_method: Option<String>,
    pub payment_date: Option<NaiveDate>,
}

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Invoice not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::NotFound => AppError::NotFound(err.to_string()),
            BillingError::Validation(msg) => AppError::ValidationError(msg),
            BillingError::Access(access) => access.into(),
            BillingError::Profile(profile) => profile.into(),
            BillingError::Notification(notification) => notification.into(),
            BillingError::Database(db) => db.into(),
        }
    }
}
