use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use profile_cell::router::profile_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn anonymous_profile_lookup_returns_null() {
    let app = profile_routes(TestConfig::default().to_arc());

    let response = app
        .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, Value::Null);
}

#[tokio::test]
async fn anonymous_profile_creation_is_unauthorized() {
    let app = profile_routes(TestConfig::default().to_arc());

    let request = Request::builder()
        .method("POST")
        .uri("/me")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({
                "role": "patient",
                "full_name": "Anon",
                "phone_number": "+10000000000"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Not authenticated");
}

#[tokio::test]
async fn signed_in_user_reads_own_profile() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri());
    let user = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

    // Serves both the role lookup and the profile read.
    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .and(query_param("user_id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_profile_response(user.id, "patient", "Mona")
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let request = Request::builder()
        .uri("/me")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = profile_routes(config.to_arc()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["full_name"], "Mona");
    assert_eq!(body["role"], "patient");
}

#[tokio::test]
async fn patient_cannot_update_schedule() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri());
    let user = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "role": "patient" }])))
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("PUT")
        .uri("/doctor/schedule")
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "session_duration": 20 }).to_string()))
        .unwrap();

    let response = profile_routes(config.to_arc()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
