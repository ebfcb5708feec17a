use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::*;
use appointment_cell::services::AppointmentLifecycleService;
use shared_models::auth::AccessError;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

fn service_for(server: &MockServer) -> AppointmentLifecycleService {
    AppointmentLifecycleService::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config())
}

struct Fixture {
    server: MockServer,
    doctor: TestUser,
    patient_id: Uuid,
    appointment_id: Uuid,
}

impl Fixture {
    async fn with_status(status: &str) -> Self {
        let server = MockServer::start().await;
        let doctor = TestUser::doctor("doc@example.com");
        let patient_id = Uuid::new_v4();
        let appointment_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("id", format!("eq.{}", appointment_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                MockSupabaseResponses::appointment_response(appointment_id, patient_id, doctor.id, monday(), "10:00", status)
            ])))
            .mount(&server)
            .await;

        Self { server, doctor, patient_id, appointment_id }
    }

    async fn expect_status_patch(&self, from: &str, to: &str) {
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("status", format!("eq.{}", from)))
            .and(body_partial_json(json!({ "status": to })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                MockSupabaseResponses::appointment_response(
                    self.appointment_id, self.patient_id, self.doctor.id, monday(), "10:00", to
                )
            ])))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    async fn expect_slot_release(&self, times: u64) {
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/availability_slots"))
            .and(query_param("appointment_id", format!("eq.{}", self.appointment_id)))
            .and(query_param("time_slot", "eq.10:00"))
            .and(body_partial_json(json!({ "is_booked": false })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                MockSupabaseResponses::slot_response(self.doctor.id, monday(), "10:00", false, None)
            ])))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    async fn expect_notification(&self, notification_type: &str, message: Option<&str>, times: u64) {
        let mut body = json!({ "user_id": self.patient_id });
        if times > 0 {
            body["type"] = json!(notification_type);
        }
        if let Some(message) = message {
            body["message"] = json!(message);
        }

        Mock::given(method("POST"))
            .and(path("/rest/v1/notifications"))
            .and(body_partial_json(body))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([
                MockSupabaseResponses::notification_response(self.patient_id, notification_type, false)
            ])))
            .expect(times)
            .mount(&self.server)
            .await;
    }
}

#[tokio::test]
async fn rejecting_releases_slot_and_notifies_patient() {
    let fixture = Fixture::with_status("pending").await;
    fixture.expect_status_patch("pending", "rejected").await;
    fixture.expect_slot_release(1).await;
    fixture
        .expect_notification(
            "appointment_rejected",
            Some("Your appointment request for 2025-03-03 at 10:00 has been rejected"),
            1,
        )
        .await;

    let updated = service_for(&fixture.server)
        .update_appointment_status(&fixture.doctor.to_auth_context(), fixture.appointment_id, AppointmentStatus::Rejected)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Rejected);
}

#[tokio::test]
async fn cancelling_a_confirmed_visit_releases_slot() {
    let fixture = Fixture::with_status("confirmed").await;
    fixture.expect_status_patch("confirmed", "cancelled").await;
    fixture.expect_slot_release(1).await;
    fixture.expect_notification("appointment_cancelled", None, 1).await;

    let updated = service_for(&fixture.server)
        .update_appointment_status(&fixture.doctor.to_auth_context(), fixture.appointment_id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn confirming_keeps_slot_booked() {
    let fixture = Fixture::with_status("pending").await;
    fixture.expect_status_patch("pending", "confirmed").await;
    fixture.expect_slot_release(0).await;
    fixture
        .expect_notification(
            "appointment_confirmed",
            Some("Your appointment for 2025-03-03 at 10:00 has been confirmed"),
            1,
        )
        .await;

    let updated = service_for(&fixture.server)
        .update_appointment_status(&fixture.doctor.to_auth_context(), fixture.appointment_id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn no_show_has_no_side_effects() {
    let fixture = Fixture::with_status("confirmed").await;
    fixture.expect_status_patch("confirmed", "no_show").await;
    fixture.expect_slot_release(0).await;
    fixture.expect_notification("appointment_cancelled", None, 0).await;

    let updated = service_for(&fixture.server)
        .update_appointment_status(&fixture.doctor.to_auth_context(), fixture.appointment_id, AppointmentStatus::NoShow)
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::NoShow);
}

#[tokio::test]
async fn only_the_appointment_doctor_changes_status() {
    let fixture = Fixture::with_status("pending").await;
    let other_doctor = TestUser::doctor("other@example.com");

    let result = service_for(&fixture.server)
        .update_appointment_status(&other_doctor.to_auth_context(), fixture.appointment_id, AppointmentStatus::Confirmed)
        .await;

    assert_matches!(result, Err(AppointmentError::Access(AccessError::Forbidden(_))));
}

#[tokio::test]
async fn status_update_refuses_completion() {
    let fixture = Fixture::with_status("confirmed").await;

    let result = service_for(&fixture.server)
        .update_appointment_status(&fixture.doctor.to_auth_context(), fixture.appointment_id, AppointmentStatus::Completed)
        .await;

    assert_matches!(result, Err(AppointmentError::CompletionRequiresRecord));
}

#[tokio::test]
async fn finished_appointments_cannot_be_reopened() {
    let fixture = Fixture::with_status("completed").await;

    let result = service_for(&fixture.server)
        .update_appointment_status(&fixture.doctor.to_auth_context(), fixture.appointment_id, AppointmentStatus::Confirmed)
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Confirmed
        })
    );
}

#[tokio::test]
async fn missing_appointment_is_not_found() {
    let server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = service_for(&server)
        .update_appointment_status(&doctor.to_auth_context(), Uuid::new_v4(), AppointmentStatus::Confirmed)
        .await;

    assert_matches!(result, Err(AppointmentError::NotFound));
}

#[tokio::test]
async fn completing_twice_is_a_no_op() {
    let fixture = Fixture::with_status("completed").await;
    let service = service_for(&fixture.server);

    let appointment = service.find(fixture.appointment_id, None).await.unwrap();
    let completed = service.complete_appointment(&appointment, None).await.unwrap();

    assert_eq!(completed.status, AppointmentStatus::Completed);
    let patches = fixture
        .server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .count();
    assert_eq!(patches, 0);
}
