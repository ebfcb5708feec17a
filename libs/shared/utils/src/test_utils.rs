use std::sync::Arc;
use chrono::{Duration, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, Identity, UserRole};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            server_port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: Option<UserRole>,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: Some(UserRole::Patient),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: Option<UserRole>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Some(UserRole::Doctor))
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Some(UserRole::Patient))
    }

    /// A signed-in user who has not picked a role yet.
    pub fn without_profile(email: &str) -> Self {
        Self::new(email, None)
    }

    pub fn token(&self) -> String {
        format!("test-token-{}", self.id)
    }

    pub fn to_auth_context(&self) -> AuthContext {
        AuthContext::authenticated(Identity {
            user_id: self.id,
            email: Some(self.email.clone()),
            token: self.token(),
            role: self.role,
        })
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Row shapes as PostgREST returns them.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_profile_response(user_id: Uuid, role: &str, full_name: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "role": role,
            "full_name": full_name,
            "phone_number": "+10000000000",
            "email": null,
            "gender": null,
            "age": null,
            "language": "en",
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_profile_response(user_id: Uuid) -> Value {
        let day = |start: &str, end: &str, is_working: bool| json!({
            "start": start,
            "end": end,
            "is_working": is_working
        });

        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "specialization": null,
            "license_number": null,
            "working_hours": {
                "monday": day("09:00", "17:00", true),
                "tuesday": day("09:00", "17:00", true),
                "wednesday": day("09:00", "17:00", true),
                "thursday": day("09:00", "17:00", true),
                "friday": day("09:00", "17:00", true),
                "saturday": day("09:00", "14:00", true),
                "sunday": day("09:00", "14:00", false)
            },
            "is_online": false,
            "session_duration": 30,
            "leave_days": []
        })
    }

    pub fn patient_profile_response(user_id: Uuid) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "preferred_doctor_id": null,
            "medical_history": {
                "allergies": [],
                "chronic_diseases": [],
                "special_notes": ""
            },
            "emergency_contact": null
        })
    }

    pub fn appointment_response(
        appointment_id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        date: NaiveDate,
        time: &str,
        status: &str,
    ) -> Value {
        json!({
            "id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": date,
            "appointment_time": time,
            "visit_type": "consultation",
            "status": status,
            "notes": null,
            "attachments": [],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn slot_response(
        doctor_id: Uuid,
        date: NaiveDate,
        time: &str,
        is_booked: bool,
        appointment_id: Option<Uuid>,
    ) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "date": date,
            "time_slot": time,
            "is_booked": is_booked,
            "appointment_id": appointment_id
        })
    }

    pub fn notification_response(user_id: Uuid, notification_type: &str, is_read: bool) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "type": notification_type,
            "title": "Title",
            "message": "Message",
            "is_read": is_read,
            "related_appointment_id": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
