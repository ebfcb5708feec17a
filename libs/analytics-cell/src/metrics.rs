//! Reductions over rows already fetched for one doctor.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus};
use billing_cell::models::{Invoice, InvoiceStatus};
use profile_cell::models::{Gender, UserProfile};

use crate::models::{AgeGroup, AnalyticsPeriod, DashboardAnalytics, PatientAnalytics, PatientVisitSummary};

const TOP_PATIENTS: usize = 10;
const NEW_PATIENT_DAYS: i64 = 30;

pub fn dashboard(
    period: AnalyticsPeriod,
    appointments: &[Appointment],
    invoices: &[Invoice],
) -> DashboardAnalytics {
    let total = appointments.len();
    let completed = count_status(appointments, |s| s == AppointmentStatus::Completed);
    let cancelled = count_status(appointments, |s| {
        matches!(s, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    });

    let revenue = |status: InvoiceStatus| -> f64 {
        invoices
            .iter()
            .filter(|invoice| invoice.status == status)
            .map(|invoice| invoice.total)
            .sum()
    };
    let total_revenue = revenue(InvoiceStatus::Paid);
    let pending_revenue = revenue(InvoiceStatus::Pending);

    let mut visit_types = BTreeMap::new();
    let mut daily_appointments = BTreeMap::new();
    for appointment in appointments {
        *visit_types.entry(appointment.visit_type).or_insert(0) += 1;
        *daily_appointments.entry(appointment.appointment_date).or_insert(0) += 1;
    }

    DashboardAnalytics {
        total_appointments: total,
        completed_appointments: completed,
        cancelled_appointments: cancelled,
        completion_rate: ratio(completed as f64 * 100.0, total),
        total_revenue,
        pending_revenue,
        average_revenue_per_appointment: ratio(total_revenue, completed),
        visit_types,
        daily_appointments,
        period,
    }
}

/// `profiles` is keyed by user id; patients without a profile still count.
pub fn patients(
    appointments: &[Appointment],
    profiles: &HashMap<Uuid, UserProfile>,
    now: DateTime<Utc>,
) -> PatientAnalytics {
    let mut order = Vec::new();
    let mut visits: HashMap<Uuid, PatientVisitSummary> = HashMap::new();

    for appointment in appointments {
        let summary = visits.entry(appointment.patient_id).or_insert_with(|| {
            order.push(appointment.patient_id);
            PatientVisitSummary {
                patient_id: appointment.patient_id,
                profile: profiles.get(&appointment.patient_id).cloned(),
                total_visits: 0,
                last_visit: None,
            }
        });
        if appointment.status == AppointmentStatus::Completed {
            summary.total_visits += 1;
            summary.last_visit = summary.last_visit.max(Some(appointment.appointment_date));
        }
    }

    let mut summaries: Vec<PatientVisitSummary> = order
        .iter()
        .filter_map(|id| visits.remove(id))
        .collect();

    let month_ago = now - Duration::days(NEW_PATIENT_DAYS);
    let mut age_groups = BTreeMap::new();
    let mut gender_distribution = BTreeMap::new();
    let mut new_patients_this_month = 0;

    for profile in summaries.iter().filter_map(|s| s.profile.as_ref()) {
        // An unset or zero age stays out of the age buckets.
        if let Some(age) = profile.age.filter(|&age| age > 0) {
            *age_groups.entry(AgeGroup::of(age)).or_insert(0) += 1;
        }
        if profile.created_at > month_ago {
            new_patients_this_month += 1;
        }
    }
    for summary in &summaries {
        let gender = summary.profile.as_ref().and_then(|p| p.gender);
        *gender_distribution.entry(gender_label(gender).to_string()).or_insert(0) += 1;
    }

    let total_patients = summaries.len();
    // Stable, so ties keep first-seen order.
    summaries.sort_by(|a, b| b.total_visits.cmp(&a.total_visits));
    summaries.truncate(TOP_PATIENTS);

    PatientAnalytics {
        total_patients,
        new_patients_this_month,
        age_groups,
        gender_distribution,
        top_patients: summaries,
    }
}

fn count_status(appointments: &[Appointment], pred: impl Fn(AppointmentStatus) -> bool) -> usize {
    appointments.iter().filter(|a| pred(a.status)).count()
}

fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

fn gender_label(gender: Option<Gender>) -> &'static str {
    match gender {
        Some(Gender::Male) => "male",
        Some(Gender::Female) => "female",
        None => "Unknown",
    }
}
