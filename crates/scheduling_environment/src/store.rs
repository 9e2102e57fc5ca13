use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use parking_lot::RawMutex;
use parking_lot::RwLock;
use parking_lot::RwLockReadGuard;
use parking_lot::lock_api::ArcMutexGuard;
use thiserror::Error;
use tracing::debug;

use crate::ActorId;
use crate::AppointmentId;
use crate::Instant;
use crate::Interval;
use crate::ServiceType;
use crate::TechnicianId;
use crate::TicketId;
use crate::appointment::Appointment;
use crate::appointment::AppointmentStatus;
use crate::technician::Technician;
use crate::technician::TechnicianStatus;
use crate::ticket::Ticket;
use crate::ticket::TicketHistory;
use crate::ticket::TicketStatus;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError
{
    #[error("technician {0} does not exist")]
    TechnicianMissing(TechnicianId),
    #[error("technician {0} already exists")]
    TechnicianDuplicate(TechnicianId),
    #[error("ticket {0} does not exist")]
    TicketMissing(TicketId),
    #[error("ticket {0} already exists")]
    TicketDuplicate(TicketId),
    #[error("appointment {0} does not exist")]
    AppointmentMissing(AppointmentId),
    #[error("technician {technician_id} already holds skill {service_type}")]
    SkillDuplicate
    {
        technician_id: TechnicianId,
        service_type: ServiceType,
    },
    #[error("technician {technician_id} does not hold skill {service_type}")]
    SkillMissing
    {
        technician_id: TechnicianId,
        service_type: ServiceType,
    },
}

/// The appointments owned by a single technician, keyed by appointment id.
#[derive(Clone, Debug, Default)]
pub struct TechnicianSchedule
{
    appointments: BTreeMap<AppointmentId, Appointment>,
}

impl TechnicianSchedule
{
    pub fn appointments(&self) -> impl Iterator<Item = &Appointment>
    {
        self.appointments.values()
    }

    /// Pending and confirmed appointments.
    pub fn active_appointments(&self) -> impl Iterator<Item = &Appointment>
    {
        self.appointments.values().filter(|appointment| appointment.is_active())
    }

    pub fn workload(&self) -> usize
    {
        self.active_appointments().count()
    }

    pub fn get(&self, appointment_id: AppointmentId) -> Option<&Appointment>
    {
        self.appointments.get(&appointment_id)
    }

    pub fn len(&self) -> usize
    {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.appointments.is_empty()
    }
}

#[derive(Debug)]
struct TechnicianEntry
{
    profile: RwLock<Technician>,
    schedule: Arc<Mutex<TechnicianSchedule>>,
}

/// Owned storage for technicians, tickets, appointments and ticket history.
///
/// Every technician owns their schedule behind its own mutex. Holding a
/// [`ScheduleToken`] is the only way to add or change appointments, so
/// check-then-insert sequences on one technician serialize while different
/// technicians proceed in parallel.
///
/// Mutations also hold the shared side of `commit_gate` and
/// [`SchedulingStore::snapshot`] takes the exclusive side, so a snapshot
/// never observes half of a commit.
#[derive(Debug)]
pub struct SchedulingStore
{
    technicians: RwLock<BTreeMap<TechnicianId, Arc<TechnicianEntry>>>,
    tickets: RwLock<BTreeMap<TicketId, Ticket>>,
    history: RwLock<Vec<TicketHistory>>,
    appointment_owners: RwLock<HashMap<AppointmentId, TechnicianId>>,
    commit_gate: RwLock<()>,
    next_appointment_id: AtomicU64,
    next_history_id: AtomicU64,
}

/// Public API for technicians
impl SchedulingStore
{
    pub fn new() -> Self
    {
        Self {
            technicians: RwLock::new(BTreeMap::new()),
            tickets: RwLock::new(BTreeMap::new()),
            history: RwLock::new(vec![]),
            appointment_owners: RwLock::new(HashMap::new()),
            commit_gate: RwLock::new(()),
            next_appointment_id: AtomicU64::new(1),
            next_history_id: AtomicU64::new(1),
        }
    }

    pub fn add_technician(&self, technician: Technician) -> Result<TechnicianId, StoreError>
    {
        let _gate = self.commit_gate.read();
        let technician_id = technician.id();
        let mut technicians = self.technicians.write();
        if technicians.contains_key(&technician_id) {
            return Err(StoreError::TechnicianDuplicate(technician_id));
        }
        technicians.insert(
            technician_id,
            Arc::new(TechnicianEntry {
                profile: RwLock::new(technician),
                schedule: Arc::new(Mutex::new(TechnicianSchedule::default())),
            }),
        );
        Ok(technician_id)
    }

    pub fn technician(&self, technician_id: TechnicianId) -> Result<Technician, StoreError>
    {
        Ok(self.entry(technician_id)?.profile.read().clone())
    }

    /// All technicians ordered by ascending id.
    pub fn technicians(&self) -> Vec<Technician>
    {
        self.entries().iter().map(|(_, entry)| entry.profile.read().clone()).collect()
    }

    pub fn set_technician_status(&self, technician_id: TechnicianId, status: TechnicianStatus) -> Result<(), StoreError>
    {
        let entry = self.entry(technician_id)?;
        let _gate = self.commit_gate.read();
        entry.profile.write().set_status(status);
        Ok(())
    }

    pub fn assign_skill(&self, technician_id: TechnicianId, service_type: ServiceType) -> Result<(), StoreError>
    {
        let entry = self.entry(technician_id)?;
        let _gate = self.commit_gate.read();
        if !entry.profile.write().insert_skill(service_type) {
            return Err(StoreError::SkillDuplicate { technician_id, service_type });
        }
        Ok(())
    }

    pub fn remove_skill(&self, technician_id: TechnicianId, service_type: ServiceType) -> Result<(), StoreError>
    {
        let entry = self.entry(technician_id)?;
        let _gate = self.commit_gate.read();
        if !entry.profile.write().remove_skill(service_type) {
            return Err(StoreError::SkillMissing { technician_id, service_type });
        }
        Ok(())
    }
}

/// Public API for tickets and their history
impl SchedulingStore
{
    pub fn add_ticket(&self, ticket: Ticket) -> Result<TicketId, StoreError>
    {
        let _gate = self.commit_gate.read();
        let ticket_id = ticket.id();
        let mut tickets = self.tickets.write();
        if tickets.contains_key(&ticket_id) {
            return Err(StoreError::TicketDuplicate(ticket_id));
        }
        tickets.insert(ticket_id, ticket);
        Ok(ticket_id)
    }

    pub fn ticket(&self, ticket_id: TicketId) -> Result<Ticket, StoreError>
    {
        self.tickets.read().get(&ticket_id).cloned().ok_or(StoreError::TicketMissing(ticket_id))
    }

    /// Sets the ticket status and appends the matching history entry as one
    /// commit.
    pub fn record_ticket_status(&self, ticket_id: TicketId, status: TicketStatus, actor: ActorId, at: Instant) -> Result<TicketHistory, StoreError>
    {
        let _gate = self.commit_gate.read();
        let mut tickets = self.tickets.write();
        let ticket = tickets.get_mut(&ticket_id).ok_or(StoreError::TicketMissing(ticket_id))?;

        let history_id = self.next_history_id.fetch_add(1, Ordering::Relaxed);
        let entry = TicketHistory::new(history_id, ticket_id, status, at, actor);

        ticket.set_status(status);
        self.history.write().push(entry.clone());
        debug!(ticket_id, history_id, ?status, actor, "ticket history appended");
        Ok(entry)
    }

    /// History of one ticket ordered by timestamp, then by insertion.
    pub fn history_for(&self, ticket_id: TicketId) -> Vec<TicketHistory>
    {
        let mut entries = self
            .history
            .read()
            .iter()
            .filter(|entry| entry.ticket_id() == ticket_id)
            .cloned()
            .collect::<Vec<_>>();
        entries.sort_by_key(|entry| (entry.timestamp(), entry.id()));
        entries
    }
}

/// Public API for appointments
impl SchedulingStore
{
    /// Acquires the exclusive scheduling token of one technician. The token
    /// is released when dropped.
    pub fn lock_schedule(&self, technician_id: TechnicianId) -> Result<ScheduleToken<'_>, StoreError>
    {
        let entry = self.entry(technician_id)?;
        // The gate has to be taken before the schedule, snapshots take them in the same order.
        let gate = self.commit_gate.read();
        let schedule = entry.schedule.lock_arc();
        Ok(ScheduleToken {
            store: self,
            technician_id,
            schedule,
            _gate: gate,
        })
    }

    /// Runs `f` against the technician's current schedule without taking the
    /// scheduling token.
    pub fn read_schedule<R>(&self, technician_id: TechnicianId, f: impl FnOnce(&TechnicianSchedule) -> R) -> Result<R, StoreError>
    {
        let entry = self.entry(technician_id)?;
        let schedule = entry.schedule.lock();
        Ok(f(&schedule))
    }

    /// A technician's appointments whose status is one of `statuses`,
    /// ordered by start.
    pub fn appointments_for(&self, technician_id: TechnicianId, statuses: &[AppointmentStatus]) -> Result<Vec<Appointment>, StoreError>
    {
        self.read_schedule(technician_id, |schedule| {
            let mut appointments = schedule
                .appointments()
                .filter(|appointment| statuses.contains(&appointment.status()))
                .cloned()
                .collect::<Vec<_>>();
            appointments.sort_by_key(|appointment| (*appointment.interval(), appointment.id()));
            appointments
        })
    }

    pub fn appointment_owner(&self, appointment_id: AppointmentId) -> Result<TechnicianId, StoreError>
    {
        self.appointment_owners
            .read()
            .get(&appointment_id)
            .copied()
            .ok_or(StoreError::AppointmentMissing(appointment_id))
    }

    pub fn appointment(&self, appointment_id: AppointmentId) -> Result<Appointment, StoreError>
    {
        let technician_id = self.appointment_owner(appointment_id)?;
        self.read_schedule(technician_id, |schedule| schedule.get(appointment_id).cloned())?
            .ok_or(StoreError::AppointmentMissing(appointment_id))
    }
}

/// Snapshots
impl SchedulingStore
{
    /// Point-in-time copy of everything in the store. Blocks new commits
    /// until the copy is taken, and waits for in-flight ones to finish.
    pub fn snapshot(&self) -> StoreSnapshot
    {
        let _gate = self.commit_gate.write();

        let mut technicians = vec![];
        let mut appointments = vec![];
        for (_, entry) in self.entries() {
            technicians.push(entry.profile.read().clone());
            appointments.extend(entry.schedule.lock().appointments().cloned());
        }
        appointments.sort_by_key(Appointment::id);

        let tickets = self.tickets.read().values().cloned().collect();
        let history = self.history.read().clone();

        StoreSnapshot::from_parts(technicians, appointments, tickets, history)
    }
}

/// Private methods
impl SchedulingStore
{
    fn entry(&self, technician_id: TechnicianId) -> Result<Arc<TechnicianEntry>, StoreError>
    {
        self.technicians
            .read()
            .get(&technician_id)
            .cloned()
            .ok_or(StoreError::TechnicianMissing(technician_id))
    }

    fn entries(&self) -> Vec<(TechnicianId, Arc<TechnicianEntry>)>
    {
        self.technicians.read().iter().map(|(id, entry)| (*id, Arc::clone(entry))).collect()
    }
}

impl Default for SchedulingStore
{
    fn default() -> Self
    {
        Self::new()
    }
}

/// Exclusive ownership of one technician's schedule.
///
/// Do not call other [`SchedulingStore`] mutations while holding a token,
/// they would wait on the same commit gate.
pub struct ScheduleToken<'a>
{
    store: &'a SchedulingStore,
    technician_id: TechnicianId,
    // Declared before the gate so the schedule is released first.
    schedule: ArcMutexGuard<RawMutex, TechnicianSchedule>,
    _gate: RwLockReadGuard<'a, ()>,
}

impl ScheduleToken<'_>
{
    pub fn technician_id(&self) -> TechnicianId
    {
        self.technician_id
    }

    pub fn schedule(&self) -> &TechnicianSchedule
    {
        &self.schedule
    }

    /// Records a new `Pending` appointment. The caller is responsible for
    /// having checked the interval against [`Self::schedule`].
    pub fn append_appointment(&mut self, ticket_id: TicketId, service_type: ServiceType, interval: Interval) -> Appointment
    {
        let appointment_id = self.store.next_appointment_id.fetch_add(1, Ordering::Relaxed);
        let appointment = Appointment::new(
            appointment_id,
            self.technician_id,
            ticket_id,
            service_type,
            interval,
            AppointmentStatus::Pending,
        );

        self.schedule.appointments.insert(appointment_id, appointment.clone());
        self.store.appointment_owners.write().insert(appointment_id, self.technician_id);
        debug!(appointment_id, technician_id = self.technician_id, ticket_id, "appointment appended");
        appointment
    }

    pub fn set_status(&mut self, appointment_id: AppointmentId, status: AppointmentStatus) -> Result<Appointment, StoreError>
    {
        let appointment = self
            .schedule
            .appointments
            .get_mut(&appointment_id)
            .ok_or(StoreError::AppointmentMissing(appointment_id))?;
        appointment.set_status(status);
        Ok(appointment.clone())
    }

    pub fn set_interval(&mut self, appointment_id: AppointmentId, interval: Interval) -> Result<Appointment, StoreError>
    {
        let appointment = self
            .schedule
            .appointments
            .get_mut(&appointment_id)
            .ok_or(StoreError::AppointmentMissing(appointment_id))?;
        appointment.set_interval(interval);
        Ok(appointment.clone())
    }
}

/// Immutable copy of the store used for reporting.
#[derive(Clone, Debug, Default)]
pub struct StoreSnapshot
{
    technicians: Vec<Technician>,
    appointments: Vec<Appointment>,
    tickets: Vec<Ticket>,
    history: Vec<TicketHistory>,
}

impl StoreSnapshot
{
    pub fn from_parts(mut technicians: Vec<Technician>, appointments: Vec<Appointment>, tickets: Vec<Ticket>, history: Vec<TicketHistory>) -> Self
    {
        technicians.sort_by_key(Technician::id);
        Self {
            technicians,
            appointments,
            tickets,
            history,
        }
    }

    /// Ordered by ascending id.
    pub fn technicians(&self) -> &[Technician]
    {
        &self.technicians
    }

    pub fn appointments(&self) -> &[Appointment]
    {
        &self.appointments
    }

    pub fn tickets(&self) -> &[Ticket]
    {
        &self.tickets
    }

    pub fn history(&self) -> &[TicketHistory]
    {
        &self.history
    }
}
