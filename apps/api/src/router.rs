use std::sync::Arc;

use axum::{routing::get, Router};

use analytics_cell::router::analytics_routes;
use appointment_cell::router::appointment_routes;
use billing_cell::router::billing_routes;
use inventory_cell::router::inventory_routes;
use medical_record_cell::router::medical_record_routes;
use notification_cell::router::notification_routes;
use profile_cell::router::profile_routes;
use reminder_cell::router::reminder_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Dental clinic API is running!" }))
        .nest("/profiles", profile_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/medical-records", medical_record_routes(state.clone()))
        .nest("/billing", billing_routes(state.clone()))
        .nest("/inventory", inventory_routes(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
        .nest("/reminders", reminder_routes(state.clone()))
        .nest("/analytics", analytics_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    #[tokio::test]
    async fn root_reports_running() {
        let app = create_router(TestConfig::default().to_arc());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cells_are_mounted_under_their_prefix() {
        let app = create_router(TestConfig::default().to_arc());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/billing")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_ne!(response.status(), StatusCode::NOT_FOUND);
    }
}
