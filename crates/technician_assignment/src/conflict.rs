use scheduling_environment::AppointmentId;
use scheduling_environment::Instant;
use scheduling_environment::Interval;
use scheduling_environment::TechnicianId;
use scheduling_environment::appointment::Appointment;
use scheduling_environment::appointment::AppointmentStatus;
use scheduling_environment::store::SchedulingStore;
use scheduling_environment::store::TechnicianSchedule;
use tracing::debug;

use crate::error::Result;

/// Finds appointments in `schedule` that overlap `interval` under the
/// inclusive boundary rule, skipping `excluded_statuses` and `skip`.
///
/// Results are ordered by start time.
pub fn conflicts_in(
    schedule: &TechnicianSchedule,
    interval: &Interval,
    excluded_statuses: &[AppointmentStatus],
    skip: Option<AppointmentId>,
) -> Vec<Appointment>
{
    let mut conflicts = schedule
        .appointments()
        .filter(|existing| !excluded_statuses.contains(&existing.status()))
        .filter(|existing| Some(existing.id()) != skip)
        .filter(|existing| existing.interval().overlaps_with(interval))
        .cloned()
        .collect::<Vec<_>>();
    conflicts.sort_by_key(|appointment| (*appointment.interval(), appointment.id()));
    conflicts
}

pub struct ConflictDetector<'a>
{
    store: &'a SchedulingStore,
}

impl<'a> ConflictDetector<'a>
{
    pub fn new(store: &'a SchedulingStore) -> Self
    {
        Self { store }
    }

    /// Every appointment of `technician_id` whose status is not excluded and
    /// for which `existing.start <= end && existing.end >= start`.
    ///
    /// Touching appointments (`existing.end == start`) are conflicts.
    pub fn detect_conflicts(
        &self,
        technician_id: TechnicianId,
        start: Instant,
        end: Instant,
        excluded_statuses: &[AppointmentStatus],
    ) -> Result<Vec<Appointment>>
    {
        let interval = Interval::new(start, end)?;
        let conflicts = self
            .store
            .read_schedule(technician_id, |schedule| conflicts_in(schedule, &interval, excluded_statuses, None))?;
        debug!(technician_id, %start, %end, conflicts = conflicts.len(), "conflict check");
        Ok(conflicts)
    }

    pub fn is_available(&self, technician_id: TechnicianId, start: Instant, end: Instant) -> Result<bool>
    {
        Ok(self
            .detect_conflicts(technician_id, start, end, &AppointmentStatus::TERMINAL)?
            .is_empty())
    }
}
