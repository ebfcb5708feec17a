use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use profile_cell::services::ProfileService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::AuthContext;
use shared_models::time::TimeOfDay;

use crate::models::AppointmentError;
use crate::services::slots::SlotLedger;

/// Session start times from `start` up to, not including, `end`.
pub fn generate_ticks(
    start: TimeOfDay,
    end: TimeOfDay,
    step_minutes: u32,
) -> impl Iterator<Item = TimeOfDay> {
    let first = (step_minutes > 0 && start < end).then_some(start);
    std::iter::successors(first, move |tick| tick.checked_add_minutes(step_minutes))
        .take_while(move |tick| *tick < end)
}

pub struct AvailabilityService {
    profiles: ProfileService,
    slots: SlotLedger,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            profiles: ProfileService::new(config),
            slots: SlotLedger::new(supabase),
        }
    }

    pub async fn get_available_slots(
        &self,
        ctx: &AuthContext,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<TimeOfDay>, AppointmentError> {
        let Some(identity) = ctx.identity() else {
            return Ok(Vec::new());
        };
        let token = Some(identity.token.as_str());

        let Some(doctor) = self.profiles.get_doctor_profile(doctor_id, token).await? else {
            debug!("No doctor profile for {}", doctor_id);
            return Ok(Vec::new());
        };

        let Some(day) = doctor.schedule_for(date) else {
            debug!("Doctor {} does not work on {}", doctor_id, date);
            return Ok(Vec::new());
        };

        let booked: HashSet<TimeOfDay> = self
            .slots
            .booked_times(doctor_id, date, token)
            .await?
            .into_iter()
            .collect();

        Ok(generate_ticks(day.start, day.end, doctor.session_duration)
            .filter(|tick| !booked.contains(tick))
            .collect())
    }
}
