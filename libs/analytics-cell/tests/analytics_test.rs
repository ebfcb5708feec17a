use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use analytics_cell::models::*;
use analytics_cell::router::analytics_routes;
use analytics_cell::services::AnalyticsService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

fn service_for(server: &MockServer) -> AnalyticsService {
    AnalyticsService::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config())
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

fn paid_invoice(doctor_id: Uuid, total: f64) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "invoice_number": "INV-1",
        "patient_id": Uuid::new_v4(),
        "doctor_id": doctor_id,
        "appointment_id": null,
        "items": [],
        "subtotal": total,
        "tax": 0.0,
        "discount": 0.0,
        "total": total,
        "status": "paid",
        "issue_date": "2025-03-01",
        "due_date": "2025-03-31",
        "payment_method": "card",
        "payment_date": "2025-03-02",
        "notes": null,
        "created_at": Utc::now().to_rfc3339(),
        "updated_at": Utc::now().to_rfc3339()
    })
}

#[tokio::test]
async fn dashboard_reduces_window_rows() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");
    let patient = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(Uuid::new_v4(), patient, doctor.id, day(3), "10:00", "completed"),
            MockSupabaseResponses::appointment_response(Uuid::new_v4(), patient, doctor.id, day(4), "11:00", "no_show")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/invoices"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            paid_invoice(doctor.id, 300.0)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let stats = service_for(&server)
        .get_dashboard_analytics(&doctor.to_auth_context(), AnalyticsPeriod::Week)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stats.total_appointments, 2);
    assert_eq!(stats.cancelled_appointments, 1);
    assert_eq!(stats.completion_rate, 50.0);
    assert_eq!(stats.average_revenue_per_appointment, 300.0);

    let requests = server.received_requests().await.unwrap();
    let window = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "created_at")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert!(window.starts_with("gte."));
    let since = chrono::DateTime::parse_from_rfc3339(&window[4..]).unwrap().with_timezone(&Utc);
    let age = Utc::now().signed_duration_since(since);
    assert!(age >= Duration::days(7) && age < Duration::days(7) + Duration::minutes(1));
}

#[tokio::test]
async fn patients_get_no_analytics() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");
    let service = service_for(&server);

    let dashboard = service
        .get_dashboard_analytics(&patient.to_auth_context(), AnalyticsPeriod::Month)
        .await
        .unwrap();
    let breakdown = service.get_patient_analytics(&patient.to_auth_context()).await.unwrap();

    assert!(dashboard.is_none());
    assert!(breakdown.is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn patient_analytics_joins_profiles_once_per_patient() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");
    let patient = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_response(Uuid::new_v4(), patient, doctor.id, day(3), "10:00", "completed"),
            MockSupabaseResponses::appointment_response(Uuid::new_v4(), patient, doctor.id, day(9), "10:00", "completed")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("user_id", format!("eq.{}", patient)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_profile_response(patient, "patient", "Omar Said")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let stats = service_for(&server)
        .get_patient_analytics(&doctor.to_auth_context())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stats.total_patients, 1);
    assert_eq!(stats.top_patients[0].total_visits, 2);
    assert_eq!(stats.top_patients[0].last_visit, Some(day(9)));
    assert_eq!(stats.top_patients[0].profile.as_ref().unwrap().full_name, "Omar Said");
}

#[tokio::test]
async fn anonymous_dashboard_is_null() {
    let app = analytics_routes(TestConfig::default().to_arc());

    let response = app
        .oneshot(Request::builder().uri("/dashboard?period=week").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), Value::Null);
}
