use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::AuthContext;

use crate::models::{NewNotification, Notification, NotificationError};

pub struct NotificationService {
    supabase: SupabaseClient,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Appends a notification to the recipient's outbox.
    pub async fn notify(
        &self,
        notification: NewNotification,
        auth_token: Option<&str>,
    ) -> Result<Notification, NotificationError> {
        let mut row = json!(notification);
        if let Some(map) = row.as_object_mut() {
            map.insert("is_read".to_string(), json!(false));
            map.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        let stored: Notification = self.supabase.insert("notifications", row, auth_token).await?;
        debug!(
            "Queued {:?} notification {} for user {}",
            stored.notification_type, stored.id, stored.user_id
        );
        Ok(stored)
    }

    pub async fn get_my_notifications(
        &self,
        ctx: &AuthContext,
    ) -> Result<Vec<Notification>, NotificationError> {
        let Some(identity) = ctx.identity() else {
            return Ok(Vec::new());
        };

        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&order=created_at.desc",
            identity.user_id
        );
        Ok(self.supabase.select(&path, Some(&identity.token)).await?)
    }

    pub async fn get_unread_count(&self, ctx: &AuthContext) -> Result<usize, NotificationError> {
        let Some(identity) = ctx.identity() else {
            return Ok(0);
        };

        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&is_read=eq.false&select=id",
            identity.user_id
        );
        let rows: Vec<serde_json::Value> = self.supabase.select(&path, Some(&identity.token)).await?;
        Ok(rows.len())
    }

    pub async fn mark_as_read(
        &self,
        ctx: &AuthContext,
        notification_id: Uuid,
    ) -> Result<Notification, NotificationError> {
        let identity = ctx.require_identity()?;
        let token = Some(identity.token.as_str());

        let path = format!("/rest/v1/notifications?id=eq.{}", notification_id);
        let notification: Notification = self
            .supabase
            .select_one(&path, token)
            .await?
            .ok_or(NotificationError::NotFound)?;

        ctx.ensure_is(notification.user_id)?;

        if notification.is_read {
            return Ok(notification);
        }

        let mut rows: Vec<Notification> = self
            .supabase
            .update(&path, json!({ "is_read": true }), token)
            .await?;
        rows.pop().ok_or(NotificationError::NotFound)
    }

    /// Returns how many notifications were flipped to read.
    pub async fn mark_all_as_read(&self, ctx: &AuthContext) -> Result<usize, NotificationError> {
        let identity = ctx.require_identity()?;

        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&is_read=eq.false",
            identity.user_id
        );
        let rows: Vec<Notification> = self
            .supabase
            .update(&path, json!({ "is_read": true }), Some(&identity.token))
            .await?;

        info!("Marked {} notifications read for user {}", rows.len(), identity.user_id);
        Ok(rows.len())
    }
}
