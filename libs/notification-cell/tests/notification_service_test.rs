use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::models::*;
use notification_cell::services::NotificationService;
use shared_models::auth::{AccessError, AuthContext};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

fn service_for(server: &MockServer) -> NotificationService {
    NotificationService::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config())
}

#[tokio::test]
async fn notify_stores_an_unread_row() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .and(body_partial_json(json!({
            "user_id": doctor_id,
            "type": "appointment_request",
            "is_read": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::notification_response(doctor_id, "appointment_request", false)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let stored = service_for(&server)
        .notify(
            NewNotification::new(
                doctor_id,
                NotificationType::AppointmentRequest,
                "New Appointment Request",
                "You have a new appointment request",
            ),
            Some("token"),
        )
        .await
        .unwrap();

    assert_eq!(stored.user_id, doctor_id);
    assert!(!stored.is_read);
}

#[tokio::test]
async fn anonymous_caller_sees_nothing() {
    let server = MockServer::start().await;
    let service = service_for(&server);

    assert!(service.get_my_notifications(&AuthContext::anonymous()).await.unwrap().is_empty());
    assert_eq!(service.get_unread_count(&AuthContext::anonymous()).await.unwrap(), 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unread_count_counts_rows() {
    let server = MockServer::start().await;
    let user = TestUser::patient("pat@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("user_id", format!("eq.{}", user.id)))
        .and(query_param("is_read", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": Uuid::new_v4() },
            { "id": Uuid::new_v4() }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let count = service_for(&server)
        .get_unread_count(&user.to_auth_context())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn only_the_recipient_can_mark_read() {
    let server = MockServer::start().await;
    let owner = Uuid::new_v4();
    let intruder = TestUser::patient("other@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(owner, "reminder", false)
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = service_for(&server)
        .mark_as_read(&intruder.to_auth_context(), Uuid::new_v4())
        .await;

    assert_matches!(result, Err(NotificationError::Access(AccessError::Forbidden(_))));
}

#[tokio::test]
async fn missing_notification_is_not_found() {
    let server = MockServer::start().await;
    let user = TestUser::patient("pat@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = service_for(&server)
        .mark_as_read(&user.to_auth_context(), Uuid::new_v4())
        .await;

    assert_matches!(result, Err(NotificationError::NotFound));
}

#[tokio::test]
async fn mark_all_patches_only_unread_rows_of_caller() {
    let server = MockServer::start().await;
    let user = TestUser::patient("pat@example.com");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/notifications"))
        .and(query_param("user_id", format!("eq.{}", user.id)))
        .and(query_param("is_read", "eq.false"))
        .and(body_partial_json(json!({ "is_read": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::notification_response(user.id, "reminder", true),
            MockSupabaseResponses::notification_response(user.id, "invoice_created", true)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = service_for(&server)
        .mark_all_as_read(&user.to_auth_context())
        .await
        .unwrap();
    assert_eq!(updated, 2);
}

#[tokio::test]
async fn mark_all_requires_sign_in() {
    let server = MockServer::start().await;

    let result = service_for(&server).mark_all_as_read(&AuthContext::anonymous()).await;
    assert_matches!(result, Err(NotificationError::Access(AccessError::NotAuthenticated)));
}
