use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::models::VisitType;
use profile_cell::models::{ProfileError, UserProfile};
use shared_database::DatabaseError;
use shared_models::auth::AccessError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticsPeriod {
    Week,
    Month,
    Year,
}

impl AnalyticsPeriod {
    pub fn days(self) -> i64 {
        match self {
            AnalyticsPeriod::Week => 7,
            AnalyticsPeriod::Month => 30,
            AnalyticsPeriod::Year => 365,
        }
    }

    pub fn window_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardQuery {
    pub period: AnalyticsPeriod,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardAnalytics {
    pub total_appointments: usize,
    pub completed_appointments: usize,
    pub cancelled_appointments: usize,
    pub completion_rate: f64,
    pub total_revenue: f64,
    pub pending_revenue: f64,
    pub average_revenue_per_appointment: f64,
    pub visit_types: BTreeMap<VisitType, usize>,
    pub daily_appointments: BTreeMap<NaiveDate, usize>,
    pub period: AnalyticsPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AgeGroup {
    #[serde(rename = "Under 18")]
    Under18,
    #[serde(rename = "18-34")]
    From18To34,
    #[serde(rename = "35-54")]
    From35To54,
    #[serde(rename = "55+")]
    From55,
}

impl AgeGroup {
    pub fn of(age: u32) -> Self {
        match age {
            0..=17 => AgeGroup::Under18,
            18..=34 => AgeGroup::From18To34,
            35..=54 => AgeGroup::From35To54,
            _ => AgeGroup::From55,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatientVisitSummary {
    pub patient_id: Uuid,
    pub profile: Option<UserProfile>,
    pub total_visits: usize,
    pub last_visit: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatientAnalytics {
    pub total_patients: usize,
    pub new_patients_this_month: usize,
    pub age_groups: BTreeMap<AgeGroup, usize>,
    pub gender_distribution: BTreeMap<String, usize>,
    pub top_patients: Vec<PatientVisitSummary>,
}

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Access(access) => access.into(),
            AnalyticsError::Profile(profile) => profile.into(),
            AnalyticsError::Database(db) => db.into(),
        }
    }
}
