use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::AuthContext;
use shared_models::error::AppError;

use crate::models::DashboardQuery;
use crate::services::AnalyticsService;

#[axum::debug_handler]
pub async fn get_dashboard_analytics(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AnalyticsService::new(&state);
    let analytics = service.get_dashboard_analytics(&ctx, query.period).await?;

    Ok(Json(json!(analytics)))
}

#[axum::debug_handler]
pub async fn get_patient_analytics(
    State(state): State<Arc<AppConfig>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Value>, AppError> {
    let service = AnalyticsService::new(&state);
    let analytics = service.get_patient_analytics(&ctx).await?;

    Ok(Json(json!(analytics)))
}
