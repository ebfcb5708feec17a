use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::AuthContext;
use shared_models::error::AppError;

use crate::models::{CreateInvoiceRequest, UpdateInvoiceStatusRequest};
use crate::services::BillingService;

#[axum::debug_handler]
pub async fn create_invoice(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BillingService::new(&state);
    let invoice = service.create_invoice(&ctx, request).await?;

    Ok(Json(json!({
        "id": invoice.id,
        "invoice_number": invoice.invoice_number
    })))
}

#[axum::debug_handler]
pub async fn get_my_invoices(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = BillingService::new(&state);
    let invoices = service.get_my_invoices(&ctx).await?;

    Ok(Json(json!({
        "invoices": invoices,
        "total": invoices.len()
    })))
}

#[axum::debug_handler]
pub async fn update_invoice_status(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Path(invoice_id): Path<Uuid>,
    Json(request): Json<UpdateInvoiceStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BillingService::new(&state);
    let invoice = service.update_invoice_status(&ctx, invoice_id, request).await?;

    Ok(Json(json!(invoice)))
}
