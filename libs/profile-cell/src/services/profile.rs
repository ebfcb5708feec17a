use chrono::Utc;
use futures::future::try_join_all;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{AuthContext, UserRole};

use crate::models::{
    CreateUserProfileRequest, DoctorProfile, DoctorWithProfile, MedicalHistory, PatientProfile,
    ProfileError, UpdateDoctorScheduleRequest, UpdateMedicalHistoryRequest,
    UpdateUserProfileRequest, UserProfile, WorkingHours,
};

pub struct ProfileService {
    supabase: SupabaseClient,
}

impl ProfileService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    // ==========================================================================
    // LOOKUPS SHARED WITH OTHER CELLS
    // ==========================================================================

    pub async fn find_user_profile(
        &self,
        user_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Option<UserProfile>, ProfileError> {
        let path = format!("/rest/v1/user_profiles?user_id=eq.{}", user_id);
        Ok(self.supabase.select_one(&path, auth_token).await?)
    }

    pub async fn get_doctor_profile(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Option<DoctorProfile>, ProfileError> {
        let path = format!("/rest/v1/doctor_profiles?user_id=eq.{}", doctor_id);
        Ok(self.supabase.select_one(&path, auth_token).await?)
    }

    pub async fn find_patient_profile(
        &self,
        patient_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Option<PatientProfile>, ProfileError> {
        let path = format!("/rest/v1/patient_profiles?user_id=eq.{}", patient_id);
        Ok(self.supabase.select_one(&path, auth_token).await?)
    }

    // ==========================================================================
    // USER PROFILES
    // ==========================================================================

    pub async fn get_current_user_profile(
        &self,
        ctx: &AuthContext,
    ) -> Result<Option<UserProfile>, ProfileError> {
        let Some(identity) = ctx.identity() else {
            return Ok(None);
        };
        self.find_user_profile(identity.user_id, Some(&identity.token)).await
    }

    /// Creates the caller's profile and exactly one role-specific profile.
    pub async fn create_user_profile(
        &self,
        ctx: &AuthContext,
        request: CreateUserProfileRequest,
    ) -> Result<UserProfile, ProfileError> {
        let identity = ctx.require_identity()?;
        let token = Some(identity.token.as_str());

        if request.full_name.trim().is_empty() {
            return Err(ProfileError::Validation("Full name is required".to_string()));
        }

        if self.find_user_profile(identity.user_id, token).await?.is_some() {
            return Err(ProfileError::AlreadyExists);
        }

        let now = Utc::now().to_rfc3339();
        let row = json!({
            "user_id": identity.user_id,
            "role": request.role,
            "full_name": request.full_name,
            "phone_number": request.phone_number,
            "email": request.email.or_else(|| identity.email.clone()),
            "gender": request.gender,
            "age": request.age,
            "language": request.language,
            "is_active": true,
            "created_at": now,
            "updated_at": now,
        });

        let profile: UserProfile = self
            .supabase
            .insert("user_profiles", row, token)
            .await
            .map_err(|e| if e.is_conflict() { ProfileError::AlreadyExists } else { e.into() })?;

        match request.role {
            UserRole::Doctor => {
                let row = json!({
                    "user_id": identity.user_id,
                    "working_hours": WorkingHours::default(),
                    "is_online": false,
                    "session_duration": 30,
                    "leave_days": [],
                });
                let _: DoctorProfile = self.supabase.insert("doctor_profiles", row, token).await?;
            }
            UserRole::Patient => {
                let row = json!({
                    "user_id": identity.user_id,
                    "medical_history": MedicalHistory::default(),
                });
                let _: PatientProfile = self.supabase.insert("patient_profiles", row, token).await?;
            }
        }

        info!("Created {} profile {} for user {}", profile.role, profile.id, identity.user_id);
        Ok(profile)
    }

    pub async fn update_user_profile(
        &self,
        ctx: &AuthContext,
        request: UpdateUserProfileRequest,
    ) -> Result<UserProfile, ProfileError> {
        let identity = ctx.require_identity()?;
        let token = Some(identity.token.as_str());

        if request.is_empty() {
            return self
                .find_user_profile(identity.user_id, token)
                .await?
                .ok_or(ProfileError::ProfileNotFound);
        }

        let changes = with_updated_at(json!(request));
        let path = format!("/rest/v1/user_profiles?user_id=eq.{}", identity.user_id);

        let mut rows: Vec<UserProfile> = self.supabase.update(&path, changes, token).await?;
        rows.pop().ok_or(ProfileError::ProfileNotFound)
    }

    // ==========================================================================
    // DOCTORS
    // ==========================================================================

    pub async fn get_active_doctors(
        &self,
        ctx: &AuthContext,
    ) -> Result<Vec<DoctorWithProfile>, ProfileError> {
        let Some(identity) = ctx.identity() else {
            return Ok(Vec::new());
        };
        let token = Some(identity.token.as_str());

        let doctors: Vec<UserProfile> = self
            .supabase
            .select("/rest/v1/user_profiles?role=eq.doctor&is_active=eq.true&order=full_name.asc", token)
            .await?;

        debug!("Loading doctor profiles for {} active doctors", doctors.len());

        try_join_all(doctors.into_iter().map(|profile| async move {
            let doctor_profile = self.get_doctor_profile(profile.user_id, token).await?;
            if doctor_profile.is_none() {
                warn!("Doctor {} has no doctor profile", profile.user_id);
            }
            Ok::<_, ProfileError>(DoctorWithProfile { profile, doctor_profile })
        }))
        .await
    }

    pub async fn update_doctor_status(
        &self,
        ctx: &AuthContext,
        is_online: bool,
    ) -> Result<DoctorProfile, ProfileError> {
        let identity = ctx.require_role(UserRole::Doctor, "update their status")?;

        let path = format!("/rest/v1/doctor_profiles?user_id=eq.{}", identity.user_id);
        let mut rows: Vec<DoctorProfile> = self
            .supabase
            .update(&path, json!({ "is_online": is_online }), Some(&identity.token))
            .await?;

        rows.pop().ok_or(ProfileError::DoctorProfileNotFound)
    }

    pub async fn update_doctor_schedule(
        &self,
        ctx: &AuthContext,
        request: UpdateDoctorScheduleRequest,
    ) -> Result<DoctorProfile, ProfileError> {
        let identity = ctx.require_role(UserRole::Doctor, "update their schedule")?;
        request.validate()?;

        let path = format!("/rest/v1/doctor_profiles?user_id=eq.{}", identity.user_id);
        let mut rows: Vec<DoctorProfile> = self
            .supabase
            .update(&path, json!(request), Some(&identity.token))
            .await?;

        let profile = rows.pop().ok_or(ProfileError::DoctorProfileNotFound)?;
        info!("Doctor {} updated schedule", identity.user_id);
        Ok(profile)
    }

    // ==========================================================================
    // PATIENTS
    // ==========================================================================

    pub async fn get_my_patient_profile(
        &self,
        ctx: &AuthContext,
    ) -> Result<Option<PatientProfile>, ProfileError> {
        let Some(identity) = ctx.identity() else {
            return Ok(None);
        };
        if identity.role != Some(UserRole::Patient) {
            return Ok(None);
        }
        self.find_patient_profile(identity.user_id, Some(&identity.token)).await
    }

    pub async fn update_medical_history(
        &self,
        ctx: &AuthContext,
        request: UpdateMedicalHistoryRequest,
    ) -> Result<PatientProfile, ProfileError> {
        let identity = ctx.require_role(UserRole::Patient, "update medical history")?;

        let path = format!("/rest/v1/patient_profiles?user_id=eq.{}", identity.user_id);
        let mut rows: Vec<PatientProfile> = self
            .supabase
            .update(&path, json!(request), Some(&identity.token))
            .await?;

        rows.pop().ok_or(ProfileError::PatientProfileNotFound)
    }
}

fn with_updated_at(mut changes: Value) -> Value {
    if let Some(map) = changes.as_object_mut() {
        map.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
    }
    changes
}
