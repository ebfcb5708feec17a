use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::SupabaseClient;
use shared_models::time::TimeOfDay;

use crate::models::{AppointmentError, AvailabilitySlot};

/// Booked/free state of `(doctor, date, time)` slots. Rows are created on
/// first booking; the table's unique key on that triple arbitrates races.
pub struct SlotLedger {
    supabase: Arc<SupabaseClient>,
}

impl SlotLedger {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn booked_times(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<TimeOfDay>, AppointmentError> {
        let path = format!(
            "/rest/v1/availability_slots?doctor_id=eq.{}&date=eq.{}&is_booked=eq.true",
            doctor_id, date
        );
        let slots: Vec<AvailabilitySlot> = self.supabase.select(&path, auth_token).await?;
        Ok(slots.into_iter().map(|slot| slot.time_slot).collect())
    }

    /// Marks the slot booked for `appointment_id` if nobody holds it.
    pub async fn reserve(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: TimeOfDay,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<(), AppointmentError> {
        let free_slot = format!(
            "/rest/v1/availability_slots?doctor_id=eq.{}&date=eq.{}&time_slot=eq.{}&is_booked=eq.false",
            doctor_id, date, time
        );
        let claimed: Vec<AvailabilitySlot> = self
            .supabase
            .update(
                &free_slot,
                json!({ "is_booked": true, "appointment_id": appointment_id }),
                auth_token,
            )
            .await?;

        if !claimed.is_empty() {
            debug!("Claimed existing slot {} {} for doctor {}", date, time, doctor_id);
            return Ok(());
        }

        let row = json!({
            "doctor_id": doctor_id,
            "date": date,
            "time_slot": time,
            "is_booked": true,
            "appointment_id": appointment_id,
        });

        match self.supabase.insert::<AvailabilitySlot>("availability_slots", row, auth_token).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_conflict() => {
                debug!("Slot {} {} for doctor {} is already booked", date, time, doctor_id);
                Err(AppointmentError::SlotNotAvailable)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Frees the slot held by `appointment_id`. Returns whether a row changed.
    pub async fn release(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: TimeOfDay,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<bool, AppointmentError> {
        let held_slot = format!(
            "/rest/v1/availability_slots?doctor_id=eq.{}&date=eq.{}&time_slot=eq.{}&appointment_id=eq.{}",
            doctor_id, date, time, appointment_id
        );
        let released: Vec<AvailabilitySlot> = self
            .supabase
            .update(
                &held_slot,
                json!({ "is_booked": false, "appointment_id": null }),
                auth_token,
            )
            .await?;

        if released.is_empty() {
            warn!("No slot held by appointment {} to release", appointment_id);
        }
        Ok(!released.is_empty())
    }
}
