use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use notification_cell::models::{NewNotification, NotificationType};
use notification_cell::services::NotificationService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{AuthContext, Identity, UserRole};

use crate::models::{
    AddInventoryItemRequest, InventoryCategory, InventoryError, InventoryItem, InventoryLogEntry,
    StockStatus, UpdateQuantityRequest,
};

pub struct InventoryService {
    supabase: SupabaseClient,
    notifications: NotificationService,
}

impl InventoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            notifications: NotificationService::new(config),
        }
    }

    pub async fn add_inventory_item(
        &self,
        ctx: &AuthContext,
        request: AddInventoryItemRequest,
    ) -> Result<InventoryItem, InventoryError> {
        let identity = ctx.require_role(UserRole::Doctor, "manage inventory")?;
        let token = Some(identity.token.as_str());

        if request.name.trim().is_empty() {
            return Err(InventoryError::Validation("Item name is required".to_string()));
        }
        if !request.unit_price.is_finite() || request.unit_price < 0.0 {
            return Err(InventoryError::Validation("Unit price must be non-negative".to_string()));
        }

        let now = Utc::now().to_rfc3339();
        let row = json!({
            "name": request.name.trim(),
            "category": request.category,
            "description": request.description,
            "quantity": request.quantity,
            "min_quantity": request.min_quantity,
            "unit_price": request.unit_price,
            "supplier": request.supplier,
            "expiry_date": request.expiry_date,
            "batch_number": request.batch_number,
            "status": StockStatus::derive(request.quantity, request.min_quantity),
            "created_at": now,
            "updated_at": now,
        });

        let item: InventoryItem = self.supabase.insert("inventory_items", row, token).await?;
        info!("Inventory item {} added by {}", item.id, identity.user_id);
        Ok(item)
    }

    pub async fn get_inventory_items(
        &self,
        ctx: &AuthContext,
        category: Option<InventoryCategory>,
    ) -> Result<Vec<InventoryItem>, InventoryError> {
        let Some(identity) = doctor(ctx) else {
            return Ok(Vec::new());
        };

        let path = match category {
            Some(category) => format!(
                "/rest/v1/inventory_items?category=eq.{}&order=created_at.desc",
                category.as_str()
            ),
            None => "/rest/v1/inventory_items?order=created_at.desc".to_string(),
        };
        Ok(self.supabase.select(&path, Some(identity.token.as_str())).await?)
    }

    /// Applies the change, re-derives stock status and appends a log entry.
    pub async fn update_inventory_quantity(
        &self,
        ctx: &AuthContext,
        item_id: Uuid,
        request: UpdateQuantityRequest,
    ) -> Result<InventoryItem, InventoryError> {
        let identity = ctx.require_role(UserRole::Doctor, "manage inventory")?;
        let token = Some(identity.token.as_str());

        let path = format!("/rest/v1/inventory_items?id=eq.{}", item_id);
        let item: InventoryItem = self
            .supabase
            .select_one(&path, token)
            .await?
            .ok_or(InventoryError::ItemNotFound)?;

        let new_quantity = request.operation.apply(item.quantity, request.quantity);
        let new_status = StockStatus::derive(new_quantity, item.min_quantity);

        // Guarded on the quantity read above; a lost race yields no rows.
        let guarded = format!("{}&quantity=eq.{}", path, item.quantity);
        let changes = json!({
            "quantity": new_quantity,
            "status": new_status,
            "updated_at": Utc::now().to_rfc3339(),
        });
        let mut rows: Vec<InventoryItem> = self.supabase.update(&guarded, changes, token).await?;
        let updated = rows.pop().ok_or(InventoryError::ConcurrentUpdate)?;

        let log = json!({
            "item_id": item.id,
            "user_id": identity.user_id,
            "operation": request.operation,
            "quantity_change": request.quantity,
            "previous_quantity": item.quantity,
            "new_quantity": new_quantity,
            "reason": request.reason,
            "created_at": Utc::now().to_rfc3339(),
        });
        let _: InventoryLogEntry = self.supabase.insert("inventory_logs", log, token).await?;

        if item.status == StockStatus::InStock && new_status == StockStatus::LowStock {
            let notification = NewNotification::new(
                identity.user_id,
                NotificationType::LowStock,
                "Low Stock Alert",
                format!("{} is running low ({} left).", updated.name, updated.quantity),
            );
            if let Err(e) = self.notifications.notify(notification, token).await {
                warn!("Failed to send low stock alert for item {}: {}", item.id, e);
            }
        }

        info!(
            "Inventory item {} went from {} to {}",
            item.id, item.quantity, updated.quantity
        );
        Ok(updated)
    }

    pub async fn get_low_stock_items(
        &self,
        ctx: &AuthContext,
    ) -> Result<Vec<InventoryItem>, InventoryError> {
        let Some(identity) = doctor(ctx) else {
            return Ok(Vec::new());
        };

        let path = "/rest/v1/inventory_items?status=eq.low_stock&order=quantity.asc";
        Ok(self.supabase.select(path, Some(identity.token.as_str())).await?)
    }

    pub async fn get_item_logs(
        &self,
        ctx: &AuthContext,
        item_id: Uuid,
    ) -> Result<Vec<InventoryLogEntry>, InventoryError> {
        let Some(identity) = doctor(ctx) else {
            return Ok(Vec::new());
        };

        let path = format!(
            "/rest/v1/inventory_logs?item_id=eq.{}&order=created_at.desc",
            item_id
        );
        Ok(self.supabase.select(&path, Some(identity.token.as_str())).await?)
    }
}

fn doctor(ctx: &AuthContext) -> Option<&Identity> {
    ctx.identity()
        .filter(|identity| identity.role == Some(UserRole::Doctor))
}
