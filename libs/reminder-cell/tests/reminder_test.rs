use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reminder_cell::models::*;
use reminder_cell::services::ReminderService;
use shared_models::auth::{AccessError, AuthContext};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

fn service_for(server: &MockServer) -> ReminderService {
    ReminderService::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config())
}

fn reminder_response(id: Uuid, doctor_id: Uuid, patient_id: Uuid, date: &str, interval: Option<&str>, status: &str) -> Value {
    json!({
        "id": id,
        "doctor_id": doctor_id,
        "patient_id": patient_id,
        "type": "cleaning",
        "title": "Cleaning due",
        "message": "Your six-month cleaning is due.",
        "reminder_date": date,
        "is_recurring": interval.is_some(),
        "recurring_interval": interval,
        "status": status,
        "created_at": "2025-01-01T09:00:00Z"
    })
}

fn request(patient_id: Uuid, is_recurring: bool, interval: Option<RecurringInterval>) -> CreateReminderRequest {
    CreateReminderRequest {
        patient_id,
        reminder_type: ReminderType::Cleaning,
        title: "Cleaning due".to_string(),
        message: "Your six-month cleaning is due.".to_string(),
        reminder_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        is_recurring,
        recurring_interval: interval,
    }
}

#[tokio::test]
async fn doctor_schedules_active_reminder() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");
    let patient_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/reminders"))
        .and(body_partial_json(json!({
            "doctor_id": doctor.id,
            "patient_id": patient_id,
            "type": "cleaning",
            "status": "active",
            "recurring_interval": "monthly"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            reminder_response(Uuid::new_v4(), doctor.id, patient_id, "2025-07-01", Some("monthly"), "active")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let reminder = service_for(&server)
        .create_reminder(&doctor.to_auth_context(), request(patient_id, true, Some(RecurringInterval::Monthly)))
        .await
        .unwrap();

    assert_eq!(reminder.status, ReminderStatus::Active);
}

#[tokio::test]
async fn recurring_without_interval_is_rejected() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");

    let result = service_for(&server)
        .create_reminder(&doctor.to_auth_context(), request(Uuid::new_v4(), true, None))
        .await;

    assert_matches!(result, Err(ReminderError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn patients_cannot_schedule_reminders() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("pat@example.com");

    let result = service_for(&server)
        .create_reminder(&patient.to_auth_context(), request(patient.id, false, None))
        .await;

    assert_matches!(result, Err(ReminderError::Access(AccessError::Forbidden(_))));
}

#[tokio::test]
async fn doctor_reminders_come_with_patients() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/reminders"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .and(query_param("status", "eq.active"))
        .and(query_param("order", "reminder_date.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            reminder_response(Uuid::new_v4(), doctor.id, patient_id, "2025-07-01", None, "active")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("user_id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_profile_response(patient_id, "patient", "Omar Said")
        ])))
        .mount(&server)
        .await;

    let reminders = service_for(&server)
        .get_doctor_reminders(&doctor.to_auth_context())
        .await
        .unwrap();

    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].patient.as_ref().unwrap().full_name, "Omar Said");

    let anonymous = service_for(&server)
        .get_doctor_reminders(&AuthContext::anonymous())
        .await
        .unwrap();
    assert!(anonymous.is_empty());
}

#[tokio::test]
async fn completing_recurring_reminder_rolls_it_forward() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");
    let reminder_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/reminders"))
        .and(query_param("id", format!("eq.{}", reminder_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            reminder_response(reminder_id, doctor.id, patient_id, "2025-01-31", Some("monthly"), "active")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reminders"))
        .and(body_partial_json(json!({ "reminder_date": "2025-02-28", "status": "active" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            reminder_response(reminder_id, doctor.id, patient_id, "2025-02-28", Some("monthly"), "active")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = service_for(&server)
        .update_reminder_status(&doctor.to_auth_context(), reminder_id, ReminderStatus::Completed)
        .await
        .unwrap();

    assert_eq!(updated.status, ReminderStatus::Active);
    assert_eq!(updated.reminder_date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
}

#[tokio::test]
async fn cancelling_recurring_reminder_ends_it() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");
    let reminder_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/reminders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            reminder_response(reminder_id, doctor.id, patient_id, "2025-01-31", Some("weekly"), "active")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reminders"))
        .and(body_partial_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            reminder_response(reminder_id, doctor.id, patient_id, "2025-01-31", Some("weekly"), "cancelled")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = service_for(&server)
        .update_reminder_status(&doctor.to_auth_context(), reminder_id, ReminderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(updated.status, ReminderStatus::Cancelled);
}

#[tokio::test]
async fn other_doctors_reminder_is_forbidden() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/reminders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            reminder_response(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), "2025-01-31", None, "active")
        ])))
        .mount(&server)
        .await;

    let result = service_for(&server)
        .update_reminder_status(&doctor.to_auth_context(), Uuid::new_v4(), ReminderStatus::Completed)
        .await;

    assert_matches!(result, Err(ReminderError::Access(AccessError::Forbidden(_))));
}

#[tokio::test]
async fn reactivating_is_not_a_status_change() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");

    let result = service_for(&server)
        .update_reminder_status(&doctor.to_auth_context(), Uuid::new_v4(), ReminderStatus::Active)
        .await;

    assert_matches!(result, Err(ReminderError::InvalidStatus));
}

#[tokio::test]
async fn dispatch_counts_delivered_reminders() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/reminders"))
        .and(query_param("reminder_date", "eq.2025-07-01"))
        .and(query_param("status", "eq.active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            reminder_response(Uuid::new_v4(), doctor.id, first, "2025-07-01", None, "active"),
            reminder_response(Uuid::new_v4(), doctor.id, second, "2025-07-01", None, "active")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .and(body_partial_json(json!({ "user_id": first, "type": "reminder" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::notification_response(first, "reminder", false)
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .and(body_partial_json(json!({ "user_id": second })))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockSupabaseResponses::error_response("boom", "500")
        ))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reminders"))
        .and(body_partial_json(json!({ "last_sent_on": "2025-07-01" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            reminder_response(Uuid::new_v4(), doctor.id, first, "2025-07-01", None, "active")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let sent = service_for(&server)
        .dispatch_due_reminders(&doctor.to_auth_context(), NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
        .await
        .unwrap();

    assert_eq!(sent, 1);
}

#[tokio::test]
async fn reminders_already_sent_today_are_not_resent() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");
    let patient_id = Uuid::new_v4();

    let mut delivered = reminder_response(Uuid::new_v4(), doctor.id, patient_id, "2025-07-01", None, "active");
    delivered["last_sent_on"] = json!("2025-07-01");

    Mock::given(method("GET"))
        .and(path("/rest/v1/reminders"))
        .and(query_param("reminder_date", "eq.2025-07-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([delivered])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let sent = service_for(&server)
        .dispatch_due_reminders(&doctor.to_auth_context(), NaiveDate::from_ymd_opt(2025, 7, 1).unwrap())
        .await
        .unwrap();

    assert_eq!(sent, 0);
}
