use scheduling_environment::Instant;
use scheduling_environment::Interval;
use scheduling_environment::ServiceType;
use scheduling_environment::TechnicianId;
use scheduling_environment::appointment::Appointment;
use scheduling_environment::appointment::AppointmentStatus;
use scheduling_environment::store::SchedulingStore;
use scheduling_environment::technician::Technician;
use scheduling_environment::technician::TechnicianStatus;
use serde::Serialize;
use tracing::debug;

use crate::conflict::conflicts_in;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianLoad
{
    pub technician: Technician,
    pub workload: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSummary
{
    pub technician_id: TechnicianId,
    pub status: TechnicianStatus,
    pub current_workload: usize,
    pub available: bool,
}

pub struct AvailabilityEngine<'a>
{
    store: &'a SchedulingStore,
}

impl<'a> AvailabilityEngine<'a>
{
    pub fn new(store: &'a SchedulingStore) -> Self
    {
        Self { store }
    }

    /// Number of pending and confirmed appointments.
    pub fn compute_workload(&self, technician_id: TechnicianId) -> Result<usize>
    {
        Ok(self.store.read_schedule(technician_id, |schedule| schedule.workload())?)
    }

    /// Technicians with `required_status`, workload below `max_load` and, if
    /// given, the `service_type` skill.
    ///
    /// Ordered by ascending workload, ties by ascending id.
    pub fn find_available_technicians(
        &self,
        service_type: Option<ServiceType>,
        max_load: usize,
        required_status: TechnicianStatus,
    ) -> Result<Vec<TechnicianLoad>>
    {
        let mut candidates = vec![];
        for technician in self.store.technicians() {
            if technician.status() != required_status {
                continue;
            }
            if let Some(service_type) = service_type
                && !technician.has_skill(service_type)
            {
                continue;
            }
            let workload = self.compute_workload(technician.id())?;
            if workload < max_load {
                candidates.push(TechnicianLoad { technician, workload });
            }
        }
        candidates.sort_by_key(|candidate| (candidate.workload, candidate.technician.id()));

        debug!(?service_type, max_load, ?required_status, found = candidates.len(), "available technicians");
        Ok(candidates)
    }

    pub fn workload_summary(&self, technician_id: TechnicianId, max_load: usize) -> Result<WorkloadSummary>
    {
        let technician = self.store.technician(technician_id)?;
        let current_workload = self.compute_workload(technician_id)?;
        Ok(WorkloadSummary {
            technician_id,
            status: technician.status(),
            current_workload,
            available: technician.is_active() && current_workload < max_load,
        })
    }

    /// The technician's appointments in any status intersecting `[from, to]`,
    /// ordered by start.
    pub fn appointments_in_range(&self, technician_id: TechnicianId, from: Instant, to: Instant) -> Result<Vec<Appointment>>
    {
        let range = Interval::new(from, to)?;
        Ok(self
            .store
            .read_schedule(technician_id, |schedule| conflicts_in(schedule, &range, &[], None))?)
    }

    /// Pending and confirmed appointments of one technician, ordered by start.
    pub fn active_appointments(&self, technician_id: TechnicianId) -> Result<Vec<Appointment>>
    {
        Ok(self
            .store
            .appointments_for(technician_id, &[AppointmentStatus::Pending, AppointmentStatus::Confirmed])?)
    }
}
