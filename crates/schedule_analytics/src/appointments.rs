use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::Datelike;
use chrono::TimeDelta;
use scheduling_environment::Instant;
use scheduling_environment::ServiceType;
use scheduling_environment::TechnicianId;
use scheduling_environment::appointment::Appointment;
use scheduling_environment::appointment::AppointmentStatus;
use scheduling_environment::store::StoreSnapshot;
use serde::Serialize;

use crate::TimeWindow;
use crate::config::AnalyticsConfig;
use crate::percentage;

// Statuses that consume technician time for utilization
const BUSY_STATUSES: [AppointmentStatus; 3] = [AppointmentStatus::Pending, AppointmentStatus::Confirmed, AppointmentStatus::Completed];

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStatistics
{
    pub total_appointments: usize,
    pub pending_appointments: usize,
    pub confirmed_appointments: usize,
    pub completed_appointments: usize,
    pub cancelled_appointments: usize,
    pub no_show_appointments: usize,
    pub appointments_by_technician: BTreeMap<TechnicianId, usize>,
    /// Every status is present, with zero when unused.
    pub appointments_by_status: BTreeMap<AppointmentStatus, usize>,
    pub appointments_by_service_type: BTreeMap<ServiceType, usize>,
    pub completion_rate: f64,
    pub no_show_rate: f64,
    /// Mean length of completed appointments, in hours.
    pub average_appointment_duration: f64,
    /// Booked hours over available capacity.
    pub utilization_rate: f64,
}

/// Appointments whose start lies in `window`.
pub(crate) fn appointment_statistics(snapshot: &StoreSnapshot, config: &AnalyticsConfig, window: TimeWindow) -> AppointmentStatistics
{
    let appointments = snapshot
        .appointments()
        .iter()
        .filter(|appointment| window.contains(appointment.interval().start()))
        .collect::<Vec<_>>();

    let mut appointments_by_status = AppointmentStatus::ALL.iter().map(|status| (*status, 0)).collect::<BTreeMap<_, _>>();
    let mut appointments_by_technician = BTreeMap::new();
    let mut appointments_by_service_type = BTreeMap::new();
    for appointment in &appointments {
        *appointments_by_status.entry(appointment.status()).or_insert(0) += 1;
        *appointments_by_technician.entry(appointment.technician_id()).or_insert(0) += 1;
        *appointments_by_service_type.entry(appointment.service_type()).or_insert(0) += 1;
    }

    let count = |status: AppointmentStatus| appointments_by_status.get(&status).copied().unwrap_or(0);
    let total_appointments = appointments.len();
    let pending_appointments = count(AppointmentStatus::Pending);
    let confirmed_appointments = count(AppointmentStatus::Confirmed);
    let completed_appointments = count(AppointmentStatus::Completed);
    let cancelled_appointments = count(AppointmentStatus::Cancelled);
    let no_show_appointments = count(AppointmentStatus::NoShow);

    AppointmentStatistics {
        total_appointments,
        pending_appointments,
        confirmed_appointments,
        completed_appointments,
        cancelled_appointments,
        no_show_appointments,
        completion_rate: percentage(completed_appointments, total_appointments),
        no_show_rate: percentage(no_show_appointments, total_appointments),
        average_appointment_duration: average_completed_hours(&appointments),
        utilization_rate: utilization_rate(snapshot, config, window, &appointments),
        appointments_by_technician,
        appointments_by_status,
        appointments_by_service_type,
    }
}

fn hours(delta: TimeDelta) -> f64
{
    delta.num_seconds() as f64 / 3600.0
}

fn average_completed_hours(appointments: &[&Appointment]) -> f64
{
    let durations = appointments
        .iter()
        .filter(|appointment| appointment.status() == AppointmentStatus::Completed)
        .map(|appointment| hours(appointment.interval().duration()))
        .collect::<Vec<_>>();
    if durations.is_empty() {
        return 0.0;
    }
    durations.iter().sum::<f64>() / durations.len() as f64
}

/// Busy hours of active technicians divided by
/// `business_hours_per_day * working days * active technicians`.
///
/// An unbounded window is closed by the earliest start and latest end of
/// the appointments in it.
fn utilization_rate(snapshot: &StoreSnapshot, config: &AnalyticsConfig, window: TimeWindow, appointments: &[&Appointment]) -> f64
{
    let Some(from) = window
        .from()
        .or_else(|| appointments.iter().map(|appointment| appointment.interval().start()).min())
    else {
        return 0.0;
    };
    let Some(to) = window
        .to()
        .or_else(|| appointments.iter().map(|appointment| appointment.interval().end()).max())
    else {
        return 0.0;
    };

    let active_technicians = snapshot
        .technicians()
        .iter()
        .filter(|technician| technician.is_active())
        .map(|technician| technician.id())
        .collect::<BTreeSet<_>>();

    // Busy time and capacity cover the same technicians.
    let busy_hours = appointments
        .iter()
        .filter(|appointment| BUSY_STATUSES.contains(&appointment.status()))
        .filter(|appointment| active_technicians.contains(&appointment.technician_id()))
        .filter_map(|appointment| appointment.interval().clipped_to(from, to))
        .map(hours)
        .sum::<f64>();

    let capacity_hours = config.business_hours_per_day * working_days(config, from, to) as f64 * active_technicians.len() as f64;
    if capacity_hours <= 0.0 {
        return 0.0;
    }
    busy_hours / capacity_hours
}

/// Calendar days in `[from, to]` that fall on a configured working day.
fn working_days(config: &AnalyticsConfig, from: Instant, to: Instant) -> usize
{
    let Ok(offset) = config.reference_offset() else {
        return 0;
    };
    let first = from.with_timezone(&offset).date_naive();
    let last = to.with_timezone(&offset).date_naive();
    first
        .iter_days()
        .take_while(|date| *date <= last)
        .filter(|date| config.working_days.contains(&date.weekday()))
        .count()
}
