use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use notification_cell::models::NotificationError;
use shared_database::DatabaseError;
use shared_models::auth::AccessError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InventoryCategory {
    Instruments,
    Materials,
    Medications,
    Supplies,
    Equipment,
}

impl InventoryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryCategory::Instruments => "instruments",
            InventoryCategory::Materials => "materials",
            InventoryCategory::Medications => "medications",
            InventoryCategory::Supplies => "supplies",
            InventoryCategory::Equipment => "equipment",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
}

impl StockStatus {
    /// Stock at or below the minimum counts as low.
    pub fn derive(quantity: u32, min_quantity: u32) -> Self {
        if quantity <= min_quantity {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuantityOperation {
    Add,
    Subtract,
    Set,
}

impl QuantityOperation {
    pub fn apply(self, current: u32, amount: u32) -> u32 {
        match self {
            QuantityOperation::Add => current.saturating_add(amount),
            QuantityOperation::Subtract => current.saturating_sub(amount),
            QuantityOperation::Set => amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: InventoryCategory,
    pub description: Option<String>,
    pub quantity: u32,
    pub min_quantity: u32,
    pub unit_price: f64,
    pub supplier: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub status: StockStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryLogEntry {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub operation: QuantityOperation,
    pub quantity_change: u32,
    pub previous_quantity: u32,
    pub new_quantity: u32,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddInventoryItemRequest {
    pub name: String,
    pub category: InventoryCategory,
    pub description: Option<String>,
    pub quantity: u32,
    pub min_quantity: u32,
    pub unit_price: f64,
    pub supplier: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
    pub operation: QuantityOperation,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryQuery {
    pub category: Option<InventoryCategory>,
}

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Item not found")]
    ItemNotFound,

    #[error("Item quantity changed while updating; try again")]
    ConcurrentUpdate,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ItemNotFound => AppError::NotFound(err.to_string()),
            InventoryError::ConcurrentUpdate => AppError::Conflict(err.to_string()),
            InventoryError::Validation(msg) => AppError::ValidationError(msg),
            InventoryError::Access(access) => access.into(),
            InventoryError::Notification(notification) => notification.into(),
            InventoryError::Database(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_at_minimum_is_low() {
        assert_eq!(StockStatus::derive(5, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(0, 0), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(6, 5), StockStatus::InStock);
    }

    #[test]
    fn subtract_floors_at_zero() {
        assert_eq!(QuantityOperation::Subtract.apply(3, 10), 0);
        assert_eq!(QuantityOperation::Subtract.apply(10, 3), 7);
        assert_eq!(QuantityOperation::Add.apply(10, 3), 13);
        assert_eq!(QuantityOperation::Set.apply(10, 3), 3);
    }
}
