use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use notification_cell::models::{NewNotification, NotificationType};
use notification_cell::services::NotificationService;
use profile_cell::services::ProfileService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{AuthContext, Identity, UserRole};

use crate::models::{
    CreateReminderRequest, Reminder, ReminderError, ReminderStatus, ReminderWithPatient,
};

pub struct ReminderService {
    supabase: SupabaseClient,
    profiles: ProfileService,
    notifications: NotificationService,
}

impl ReminderService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            profiles: ProfileService::new(config),
            notifications: NotificationService::new(config),
        }
    }

    pub async fn create_reminder(
        &self,
        ctx: &AuthContext,
        request: CreateReminderRequest,
    ) -> Result<Reminder, ReminderError> {
        let identity = ctx.require_role(UserRole::Doctor, "create reminders")?;
        request.validate()?;

        let interval = request.recurring_interval.filter(|_| request.is_recurring);
        let row = json!({
            "doctor_id": identity.user_id,
            "patient_id": request.patient_id,
            "type": request.reminder_type,
            "title": request.title,
            "message": request.message,
            "reminder_date": request.reminder_date,
            "is_recurring": request.is_recurring,
            "recurring_interval": interval,
            "status": ReminderStatus::Active,
            "created_at": Utc::now().to_rfc3339(),
        });

        let reminder: Reminder = self
            .supabase
            .insert("reminders", row, Some(identity.token.as_str()))
            .await?;

        info!("Doctor {} scheduled reminder {} for {}", identity.user_id, reminder.id, reminder.reminder_date);
        Ok(reminder)
    }

    pub async fn get_doctor_reminders(
        &self,
        ctx: &AuthContext,
    ) -> Result<Vec<ReminderWithPatient>, ReminderError> {
        let Some(identity) = doctor(ctx) else {
            return Ok(Vec::new());
        };
        let token = Some(identity.token.as_str());

        let path = format!(
            "/rest/v1/reminders?doctor_id=eq.{}&status=eq.active&order=reminder_date.asc",
            identity.user_id
        );
        let reminders: Vec<Reminder> = self.supabase.select(&path, token).await?;

        try_join_all(reminders.into_iter().map(|reminder| async move {
            let patient = self.profiles.find_user_profile(reminder.patient_id, token).await?;
            Ok::<_, ReminderError>(ReminderWithPatient { reminder, patient })
        }))
        .await
    }

    /// Active reminders of the calling doctor that fall on `date`.
    pub async fn get_due_reminders(
        &self,
        ctx: &AuthContext,
        date: NaiveDate,
    ) -> Result<Vec<Reminder>, ReminderError> {
        let Some(identity) = doctor(ctx) else {
            return Ok(Vec::new());
        };

        let path = format!(
            "/rest/v1/reminders?doctor_id=eq.{}&reminder_date=eq.{}&status=eq.active",
            identity.user_id, date
        );
        Ok(self.supabase.select(&path, Some(identity.token.as_str())).await?)
    }

    /// Sends each due reminder to its patient at most once per date and
    /// returns how many went out.
    pub async fn dispatch_due_reminders(
        &self,
        ctx: &AuthContext,
        date: NaiveDate,
    ) -> Result<usize, ReminderError> {
        let identity = ctx.require_role(UserRole::Doctor, "send reminders")?;
        let token = Some(identity.token.as_str());

        let due: Vec<Reminder> = self
            .get_due_reminders(ctx, date)
            .await?
            .into_iter()
            .filter(|reminder| reminder.last_sent_on != Some(date))
            .collect();

        let mut sent = 0;
        for reminder in &due {
            let notification = NewNotification::new(
                reminder.patient_id,
                NotificationType::Reminder,
                reminder.title.clone(),
                reminder.message.clone(),
            );
            if let Err(e) = self.notifications.notify(notification, token).await {
                warn!("Failed to deliver reminder {}: {}", reminder.id, e);
                continue;
            }
            sent += 1;

            let path = format!("/rest/v1/reminders?id=eq.{}", reminder.id);
            if let Err(e) = self
                .supabase
                .update::<Reminder>(&path, json!({ "last_sent_on": date }), token)
                .await
            {
                warn!("Reminder {} went out but was not marked sent: {}", reminder.id, e);
            }
        }

        info!("Dispatched {}/{} reminders due {}", sent, due.len(), date);
        Ok(sent)
    }

    pub async fn update_reminder_status(
        &self,
        ctx: &AuthContext,
        reminder_id: Uuid,
        status: ReminderStatus,
    ) -> Result<Reminder, ReminderError> {
        let identity = ctx.require_identity()?;
        let token = Some(identity.token.as_str());

        if status == ReminderStatus::Active {
            return Err(ReminderError::InvalidStatus);
        }

        let path = format!("/rest/v1/reminders?id=eq.{}", reminder_id);
        let reminder: Reminder = self
            .supabase
            .select_one(&path, token)
            .await?
            .ok_or(ReminderError::NotFound)?;

        ctx.ensure_is(reminder.doctor_id)?;

        let next_date = match (status, reminder.is_recurring, reminder.recurring_interval) {
            (ReminderStatus::Completed, true, Some(interval)) => interval.next_after(reminder.reminder_date),
            _ => None,
        };

        let changes = match next_date {
            Some(next) => json!({ "reminder_date": next, "status": ReminderStatus::Active }),
            None => json!({ "status": status }),
        };

        let mut rows: Vec<Reminder> = self.supabase.update(&path, changes, token).await?;
        let updated = rows.pop().ok_or(ReminderError::NotFound)?;

        info!("Reminder {} is {:?} (next date {})", updated.id, updated.status, updated.reminder_date);
        Ok(updated)
    }
}

fn doctor(ctx: &AuthContext) -> Option<&Identity> {
    ctx.identity()
        .filter(|identity| identity.role == Some(UserRole::Doctor))
}
