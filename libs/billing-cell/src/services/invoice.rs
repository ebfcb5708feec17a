use chrono::Utc;
use futures::future::try_join_all;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use notification_cell::models::{NewNotification, NotificationType};
use notification_cell::services::NotificationService;
use profile_cell::services::ProfileService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{AuthContext, UserRole};

use crate::models::{
    invoice_number, BillingError, CreateInvoiceRequest, Invoice, InvoiceStatus, InvoiceWithParty,
    UpdateInvoiceStatusRequest,
};

pub struct BillingService {
    supabase: SupabaseClient,
    profiles: ProfileService,
    notifications: NotificationService,
}

impl BillingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            profiles: ProfileService::new(config),
            notifications: NotificationService::new(config),
        }
    }

    pub async fn create_invoice(
        &self,
        ctx: &AuthContext,
        request: CreateInvoiceRequest,
    ) -> Result<Invoice, BillingError> {
        let identity = ctx.require_role(UserRole::Doctor, "create invoices")?;
        let token = Some(identity.token.as_str());
        request.validate()?;

        let now = Utc::now();
        let number = invoice_number(now);

        let row = json!({
            "invoice_number": number,
            "patient_id": request.patient_id,
            "doctor_id": identity.user_id,
            "appointment_id": request.appointment_id,
            "items": request.items,
            "subtotal": request.subtotal,
            "tax": request.tax,
            "discount": request.discount.unwrap_or(0.0),
            "total": request.total,
            "status": InvoiceStatus::Pending,
            "issue_date": now.date_naive(),
            "due_date": request.due_date,
            "notes": request.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let invoice: Invoice = self.supabase.insert("invoices", row, token).await?;

        let notification = NewNotification::new(
            invoice.patient_id,
            NotificationType::InvoiceCreated,
            "New Invoice",
            format!(
                "Invoice {} has been created. Amount: ${}",
                invoice.invoice_number, invoice.total
            ),
        );
        if let Err(e) = self.notifications.notify(notification, token).await {
            warn!("Failed to notify patient about invoice {}: {}", invoice.invoice_number, e);
        }

        info!("Doctor {} issued invoice {}", identity.user_id, invoice.invoice_number);
        Ok(invoice)
    }

    pub async fn get_my_invoices(
        &self,
        ctx: &AuthContext,
    ) -> Result<Vec<InvoiceWithParty>, BillingError> {
        let Some(identity) = ctx.identity() else {
            return Ok(Vec::new());
        };
        let Some(role) = identity.role else {
            return Ok(Vec::new());
        };
        let token = Some(identity.token.as_str());

        let index = match role {
            UserRole::Doctor => "doctor_id",
            UserRole::Patient => "patient_id",
        };
        let path = format!(
            "/rest/v1/invoices?{}=eq.{}&order=created_at.desc",
            index, identity.user_id
        );
        let invoices: Vec<Invoice> = self.supabase.select(&path, token).await?;
        let today = Utc::now().date_naive();

        try_join_all(invoices.into_iter().map(|mut invoice| async move {
            let other_id = match role {
                UserRole::Doctor => invoice.patient_id,
                UserRole::Patient => invoice.doctor_id,
            };
            let other_user = self.profiles.find_user_profile(other_id, token).await?;
            invoice.status = invoice.effective_status(today);
            Ok::<_, BillingError>(InvoiceWithParty { invoice, other_user })
        }))
        .await
    }

    pub async fn update_invoice_status(
        &self,
        ctx: &AuthContext,
        invoice_id: Uuid,
        request: UpdateInvoiceStatusRequest,
    ) -> Result<Invoice, BillingError> {
        let identity = ctx.require_identity()?;
        let token = Some(identity.token.as_str());

        let path = format!("/rest/v1/invoices?id=eq.{}", invoice_id);
        let invoice: Invoice = self
            .supabase
            .select_one(&path, token)
            .await?
            .ok_or(BillingError::NotFound)?;

        ctx.ensure_is(invoice.doctor_id)?;

        let payment_date = match (request.status, request.payment_date) {
            (InvoiceStatus::Paid, None) => Some(Utc::now().date_naive()),
            (_, date) => date,
        };

        let changes = json!({
            "status": request.status,
            "payment_method": request.payment_method,
            "payment_date": payment_date,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let mut rows: Vec<Invoice> = self.supabase.update(&path, changes, token).await?;
        let updated = rows.pop().ok_or(BillingError::NotFound)?;

        if updated.status == InvoiceStatus::Paid {
            let notification = NewNotification::new(
                updated.patient_id,
                NotificationType::PaymentReceived,
                "Payment Received",
                format!("Payment for invoice {} has been received.", updated.invoice_number),
            );
            if let Err(e) = self.notifications.notify(notification, token).await {
                warn!("Failed to notify patient about payment {}: {}", updated.invoice_number, e);
            }
        }

        info!("Invoice {} is now {}", updated.invoice_number, updated.status);
        Ok(updated)
    }
}
