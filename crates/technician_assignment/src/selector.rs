use scheduling_environment::AppointmentId;
use scheduling_environment::Instant;
use scheduling_environment::Interval;
use scheduling_environment::TechnicianId;
use scheduling_environment::TicketId;
use scheduling_environment::appointment::Appointment;
use scheduling_environment::appointment::AppointmentStatus;
use scheduling_environment::store::SchedulingStore;
use scheduling_environment::technician::Technician;
use scheduling_environment::technician::TechnicianStatus;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::availability::AvailabilityEngine;
use crate::availability::TechnicianLoad;
use crate::config::EngineConfig;
use crate::conflict::conflicts_in;
use crate::error::Entity;
use crate::error::Result;
use crate::error::SchedulingError;
use crate::error::UnavailableReason;
use crate::skill_matcher::SkillMatcher;

pub struct AssignmentSelector<'a>
{
    store: &'a SchedulingStore,
    config: &'a EngineConfig,
}

/// Technician selection
impl<'a> AssignmentSelector<'a>
{
    pub fn new(store: &'a SchedulingStore, config: &'a EngineConfig) -> Self
    {
        Self { store, config }
    }

    /// Qualified, active technicians below `max_load` in the order they would
    /// be picked: lowest workload first, ties by lowest id.
    pub fn ranked_candidates(&self, ticket_id: TicketId, max_load: usize) -> Result<Vec<TechnicianLoad>>
    {
        let ticket = self.store.ticket(ticket_id)?;
        let service_type = ticket.service_type();

        let qualified = SkillMatcher::new(self.store)
            .qualified_technicians(service_type)
            .iter()
            .map(Technician::id)
            .collect::<Vec<_>>();

        let candidates = AvailabilityEngine::new(self.store)
            .find_available_technicians(Some(service_type), max_load, TechnicianStatus::Active)?
            .into_iter()
            .filter(|candidate| qualified.binary_search(&candidate.technician.id()).is_ok())
            .collect::<Vec<_>>();

        debug!(ticket_id, %service_type, max_load, candidates = candidates.len(), "ranked candidates");
        Ok(candidates)
    }

    pub fn select_technician(&self, ticket_id: TicketId, max_load: usize) -> Result<Technician>
    {
        let mut candidates = self.ranked_candidates(ticket_id, max_load)?;
        if candidates.is_empty() {
            let service_type = self.store.ticket(ticket_id)?.service_type();
            warn!(ticket_id, %service_type, max_load, "no qualified technician");
            return Err(SchedulingError::NoQualifiedTechnician { service_type });
        }
        let selected = candidates.swap_remove(0);
        debug!(ticket_id, technician_id = selected.technician.id(), workload = selected.workload, "technician selected");
        Ok(selected.technician)
    }
}

/// Booking
impl AssignmentSelector<'_>
{
    /// Books `technician_id` for `ticket_id` in `[start, end)`.
    ///
    /// Validation runs first and has no side effects. The availability check
    /// and the insert run while holding the technician's scheduling token.
    pub fn schedule_appointment(&self, ticket_id: TicketId, technician_id: TechnicianId, start: Instant, end: Instant) -> Result<Appointment>
    {
        let interval = Interval::new(start, end)?;
        let ticket = self.store.ticket(ticket_id)?;
        let technician = self.store.technician(technician_id)?;
        let service_type = ticket.service_type();

        if !technician.has_skill(service_type) {
            return Err(SchedulingError::SkillMismatch {
                technician_id,
                service_type,
            });
        }
        if !technician.is_active() {
            return Err(SchedulingError::TechnicianUnavailable {
                technician_id,
                reason: UnavailableReason::Status(technician.status()),
            });
        }

        let mut token = self.store.lock_schedule(technician_id)?;

        if self.config.enforce_workload_ceiling_on_schedule {
            let workload = token.schedule().workload();
            let max_workload = self.config.default_max_workload;
            if workload >= max_workload {
                warn!(technician_id, workload, max_workload, "workload ceiling reached");
                return Err(SchedulingError::TechnicianUnavailable {
                    technician_id,
                    reason: UnavailableReason::WorkloadCeiling { workload, max_workload },
                });
            }
        }

        let conflicts = conflicts_in(token.schedule(), &interval, &AppointmentStatus::TERMINAL, None);
        if !conflicts.is_empty() {
            let conflicting = conflicts.iter().map(Appointment::id).collect::<Vec<_>>();
            warn!(technician_id, ticket_id, ?conflicting, "scheduling conflict");
            return Err(SchedulingError::SchedulingConflict { technician_id, conflicting });
        }

        let appointment = token.append_appointment(ticket_id, service_type, interval);
        info!(
            appointment_id = appointment.id(),
            technician_id,
            ticket_id,
            %start,
            %end,
            "appointment scheduled"
        );
        Ok(appointment)
    }

    /// Picks technicians in ranking order and books the first one that
    /// commits.
    pub fn assign_and_schedule(&self, ticket_id: TicketId, start: Instant, end: Instant, max_load: usize) -> Result<Appointment>
    {
        Interval::new(start, end)?;
        let candidates = self.ranked_candidates(ticket_id, max_load)?;

        let mut last_error = None;
        for candidate in candidates {
            match self.schedule_appointment(ticket_id, candidate.technician.id(), start, end) {
                Ok(appointment) => return Ok(appointment),
                Err(error) if error.is_retriable() => {
                    debug!(ticket_id, technician_id = candidate.technician.id(), %error, "trying next candidate");
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        match last_error {
            Some(error) => Err(error),
            None => {
                let service_type = self.store.ticket(ticket_id)?.service_type();
                warn!(ticket_id, %service_type, max_load, "no qualified technician");
                Err(SchedulingError::NoQualifiedTechnician { service_type })
            }
        }
    }

    /// Moves a pending or confirmed appointment to a new interval. The
    /// appointment does not conflict with itself.
    pub fn reschedule_appointment(&self, appointment_id: AppointmentId, start: Instant, end: Instant) -> Result<Appointment>
    {
        let interval = Interval::new(start, end)?;
        let technician_id = self.store.appointment_owner(appointment_id)?;
        let mut token = self.store.lock_schedule(technician_id)?;

        let status = token
            .schedule()
            .get(appointment_id)
            .map(Appointment::status)
            .ok_or(SchedulingError::NotFound(Entity::Appointment(appointment_id)))?;
        if status.is_terminal() {
            return Err(SchedulingError::AppointmentTerminal { appointment_id, status });
        }

        let conflicts = conflicts_in(token.schedule(), &interval, &AppointmentStatus::TERMINAL, Some(appointment_id));
        if !conflicts.is_empty() {
            let conflicting = conflicts.iter().map(Appointment::id).collect::<Vec<_>>();
            warn!(technician_id, appointment_id, ?conflicting, "reschedule conflict");
            return Err(SchedulingError::SchedulingConflict { technician_id, conflicting });
        }

        let appointment = token.set_interval(appointment_id, interval)?;
        info!(appointment_id, technician_id, %start, %end, "appointment rescheduled");
        Ok(appointment)
    }
}

/// Status changes. These never re-run conflict detection.
impl AssignmentSelector<'_>
{
    pub fn set_appointment_status(&self, appointment_id: AppointmentId, next: AppointmentStatus) -> Result<Appointment>
    {
        let technician_id = self.store.appointment_owner(appointment_id)?;
        let mut token = self.store.lock_schedule(technician_id)?;

        let current = token
            .schedule()
            .get(appointment_id)
            .map(Appointment::status)
            .ok_or(SchedulingError::NotFound(Entity::Appointment(appointment_id)))?;
        if !current.can_transition_to(next) {
            return Err(SchedulingError::InvalidStatusTransition {
                appointment_id,
                from: current,
                to: next,
            });
        }

        let appointment = token.set_status(appointment_id, next)?;
        info!(appointment_id, technician_id, from = ?current, to = ?next, "appointment status changed");
        Ok(appointment)
    }

    pub fn confirm(&self, appointment_id: AppointmentId) -> Result<Appointment>
    {
        self.set_appointment_status(appointment_id, AppointmentStatus::Confirmed)
    }

    pub fn complete(&self, appointment_id: AppointmentId) -> Result<Appointment>
    {
        self.set_appointment_status(appointment_id, AppointmentStatus::Completed)
    }

    pub fn mark_no_show(&self, appointment_id: AppointmentId) -> Result<Appointment>
    {
        self.set_appointment_status(appointment_id, AppointmentStatus::NoShow)
    }

    pub fn cancel(&self, appointment_id: AppointmentId) -> Result<Appointment>
    {
        self.set_appointment_status(appointment_id, AppointmentStatus::Cancelled)
    }
}

#[cfg(test)]
mod tests
{
    use chrono::TimeZone;
    use chrono::Utc;
    use scheduling_environment::Instant;
    use scheduling_environment::ServiceType;
    use scheduling_environment::appointment::AppointmentStatus;
    use scheduling_environment::store::SchedulingStore;
    use scheduling_environment::technician::Technician;
    use scheduling_environment::technician::TechnicianStatus;
    use scheduling_environment::ticket::Ticket;

    use super::AssignmentSelector;
    use crate::config::EngineConfig;
    use crate::error::Entity;
    use crate::error::SchedulingError;
    use crate::error::UnavailableReason;

    fn at(hour: u32, minute: u32) -> Instant
    {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn store() -> SchedulingStore
    {
        let store = SchedulingStore::new();
        store
            .add_technician(Technician::builder(1).add_skill(ServiceType::Hardware).build())
            .unwrap();
        store
            .add_technician(
                Technician::builder(2)
                    .add_skill(ServiceType::Hardware)
                    .add_skill(ServiceType::Software)
                    .build(),
            )
            .unwrap();
        store
            .add_technician(
                Technician::builder(3)
                    .add_skill(ServiceType::Hardware)
                    .status(TechnicianStatus::Inactive)
                    .build(),
            )
            .unwrap();
        store.add_ticket(Ticket::new(100, 9000, ServiceType::Hardware)).unwrap();
        store.add_ticket(Ticket::new(101, 9000, ServiceType::Software)).unwrap();
        store.add_ticket(Ticket::new(102, 9000, ServiceType::Security)).unwrap();
        store
    }

    #[test]
    fn test_select_prefers_lowest_workload_then_id()
    {
        let store = store();
        let config = EngineConfig::default();
        let selector = AssignmentSelector::new(&store, &config);

        assert_eq!(selector.select_technician(100, 5).unwrap().id(), 1);
        assert_eq!(selector.select_technician(100, 5).unwrap().id(), 1);

        selector.schedule_appointment(100, 1, at(9, 0), at(10, 0)).unwrap();
        assert_eq!(selector.select_technician(100, 5).unwrap().id(), 2);
        assert_eq!(selector.select_technician(101, 5).unwrap().id(), 2);
    }

    #[test]
    fn test_select_without_candidates()
    {
        let store = store();
        let config = EngineConfig::default();
        let selector = AssignmentSelector::new(&store, &config);

        assert_eq!(
            selector.select_technician(102, 5),
            Err(SchedulingError::NoQualifiedTechnician {
                service_type: ServiceType::Security
            })
        );
        assert_eq!(
            selector.select_technician(100, 0),
            Err(SchedulingError::NoQualifiedTechnician {
                service_type: ServiceType::Hardware
            })
        );
        assert_eq!(selector.select_technician(555, 5), Err(SchedulingError::NotFound(Entity::Ticket(555))));
    }

    #[test]
    fn test_schedule_validation_order()
    {
        let store = store();
        let config = EngineConfig::default();
        let selector = AssignmentSelector::new(&store, &config);

        assert!(matches!(
            selector.schedule_appointment(100, 1, at(10, 0), at(9, 0)),
            Err(SchedulingError::InvalidInterval { .. })
        ));
        assert_eq!(
            selector.schedule_appointment(101, 1, at(9, 0), at(10, 0)),
            Err(SchedulingError::SkillMismatch {
                technician_id: 1,
                service_type: ServiceType::Software
            })
        );
        assert_eq!(
            selector.schedule_appointment(100, 3, at(9, 0), at(10, 0)),
            Err(SchedulingError::TechnicianUnavailable {
                technician_id: 3,
                reason: UnavailableReason::Status(TechnicianStatus::Inactive)
            })
        );
        assert_eq!(
            selector.schedule_appointment(100, 42, at(9, 0), at(10, 0)),
            Err(SchedulingError::NotFound(Entity::Technician(42)))
        );
        assert!(store.snapshot().appointments().is_empty());
    }

    #[test]
    fn test_workload_ceiling_on_schedule()
    {
        let store = store();
        let config = EngineConfig {
            default_max_workload: 1,
            enforce_workload_ceiling_on_schedule: true,
        };
        let selector = AssignmentSelector::new(&store, &config);

        selector.schedule_appointment(100, 1, at(9, 0), at(10, 0)).unwrap();
        assert_eq!(
            selector.schedule_appointment(100, 1, at(12, 0), at(13, 0)),
            Err(SchedulingError::TechnicianUnavailable {
                technician_id: 1,
                reason: UnavailableReason::WorkloadCeiling {
                    workload: 1,
                    max_workload: 1
                }
            })
        );

        let relaxed = EngineConfig {
            default_max_workload: 1,
            enforce_workload_ceiling_on_schedule: false,
        };
        let selector = AssignmentSelector::new(&store, &relaxed);
        assert!(selector.schedule_appointment(100, 1, at(12, 0), at(13, 0)).is_ok());
    }

    #[test]
    fn test_assign_and_schedule_falls_through_busy_candidates()
    {
        let store = store();
        let config = EngineConfig::default();
        let selector = AssignmentSelector::new(&store, &config);

        let first = selector.assign_and_schedule(100, at(9, 0), at(10, 0), 5).unwrap();
        assert_eq!(first.technician_id(), 1);

        // Technician 2 has the lower workload now and is free.
        let second = selector.assign_and_schedule(100, at(9, 0), at(10, 0), 5).unwrap();
        assert_eq!(second.technician_id(), 2);

        // Both are booked and tied on workload, neither can take the slot.
        assert!(matches!(
            selector.assign_and_schedule(100, at(9, 30), at(10, 30), 5),
            Err(SchedulingError::SchedulingConflict { .. })
        ));
        assert!(matches!(
            selector.assign_and_schedule(102, at(9, 0), at(10, 0), 5),
            Err(SchedulingError::NoQualifiedTechnician { .. })
        ));
    }

    #[test]
    fn test_lifecycle_and_reschedule()
    {
        let store = store();
        let config = EngineConfig::default();
        let selector = AssignmentSelector::new(&store, &config);

        let booked = selector.schedule_appointment(100, 1, at(9, 0), at(10, 0)).unwrap();
        let blocker = selector.schedule_appointment(100, 1, at(12, 0), at(13, 0)).unwrap();

        // Moving onto itself is fine, touching another booking is not.
        let moved = selector.reschedule_appointment(booked.id(), at(9, 30), at(10, 30)).unwrap();
        assert_eq!(moved.interval().start(), at(9, 30));
        assert!(matches!(
            selector.reschedule_appointment(booked.id(), at(11, 0), at(12, 0)),
            Err(SchedulingError::SchedulingConflict { .. })
        ));

        assert_eq!(
            selector.complete(booked.id()),
            Err(SchedulingError::InvalidStatusTransition {
                appointment_id: booked.id(),
                from: AppointmentStatus::Pending,
                to: AppointmentStatus::Completed
            })
        );
        selector.confirm(booked.id()).unwrap();
        assert_eq!(selector.complete(booked.id()).unwrap().status(), AppointmentStatus::Completed);
        assert_eq!(
            selector.reschedule_appointment(booked.id(), at(15, 0), at(16, 0)),
            Err(SchedulingError::AppointmentTerminal {
                appointment_id: booked.id(),
                status: AppointmentStatus::Completed
            })
        );

        selector.cancel(blocker.id()).unwrap();
        assert!(selector.mark_no_show(blocker.id()).is_err());
        assert_eq!(
            selector.cancel(9999),
            Err(SchedulingError::NotFound(Entity::Appointment(9999)))
        );
    }
}
