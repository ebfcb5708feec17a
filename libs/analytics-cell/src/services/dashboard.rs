use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use futures::future::try_join_all;
use tracing::debug;

use appointment_cell::models::Appointment;
use billing_cell::models::Invoice;
use profile_cell::services::ProfileService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{AuthContext, UserRole};

use crate::metrics;
use crate::models::{AnalyticsError, AnalyticsPeriod, DashboardAnalytics, PatientAnalytics};

pub struct AnalyticsService {
    supabase: SupabaseClient,
    profiles: ProfileService,
}

impl AnalyticsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            profiles: ProfileService::new(config),
        }
    }

    /// `None` unless the caller is a doctor.
    pub async fn get_dashboard_analytics(
        &self,
        ctx: &AuthContext,
        period: AnalyticsPeriod,
    ) -> Result<Option<DashboardAnalytics>, AnalyticsError> {
        let Some(identity) = ctx.identity().filter(|i| i.role == Some(UserRole::Doctor)) else {
            return Ok(None);
        };
        let token = Some(identity.token.as_str());

        let since = period.window_start(Utc::now()).to_rfc3339();
        let since = urlencoding::encode(&since);

        let appointments_path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&created_at=gte.{}",
            identity.user_id, since
        );
        let invoices_path = format!(
            "/rest/v1/invoices?doctor_id=eq.{}&created_at=gte.{}",
            identity.user_id, since
        );

        let (appointments, invoices) = futures::try_join!(
            self.supabase.select::<Appointment>(&appointments_path, token),
            self.supabase.select::<Invoice>(&invoices_path, token),
        )?;

        debug!(
            "Dashboard for {} over {:?}: {} appointments, {} invoices",
            identity.user_id,
            period,
            appointments.len(),
            invoices.len()
        );
        Ok(Some(metrics::dashboard(period, &appointments, &invoices)))
    }

    pub async fn get_patient_analytics(
        &self,
        ctx: &AuthContext,
    ) -> Result<Option<PatientAnalytics>, AnalyticsError> {
        let Some(identity) = ctx.identity().filter(|i| i.role == Some(UserRole::Doctor)) else {
            return Ok(None);
        };
        let token = Some(identity.token.as_str());

        let path = format!("/rest/v1/appointments?doctor_id=eq.{}", identity.user_id);
        let appointments: Vec<Appointment> = self.supabase.select(&path, token).await?;

        let patient_ids: BTreeSet<_> = appointments.iter().map(|a| a.patient_id).collect();
        let profiles = try_join_all(patient_ids.into_iter().map(|patient_id| async move {
            let profile = self.profiles.find_user_profile(patient_id, token).await?;
            Ok::<_, AnalyticsError>(profile.map(|p| (patient_id, p)))
        }))
        .await?;
        let profiles: HashMap<_, _> = profiles.into_iter().flatten().collect();

        Ok(Some(metrics::patients(&appointments, &profiles, Utc::now())))
    }
}
