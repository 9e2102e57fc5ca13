use std::fmt;

use scheduling_environment::AppointmentId;
use scheduling_environment::Instant;
use scheduling_environment::InvalidInterval;
use scheduling_environment::ServiceType;
use scheduling_environment::TechnicianId;
use scheduling_environment::TicketId;
use scheduling_environment::appointment::AppointmentStatus;
use scheduling_environment::store::StoreError;
use scheduling_environment::technician::TechnicianStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchedulingError>;

/// Records referenced by an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity
{
    Technician(TechnicianId),
    Ticket(TicketId),
    Appointment(AppointmentId),
    Skill
    {
        technician_id: TechnicianId,
        service_type: ServiceType,
    },
}

impl fmt::Display for Entity
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Entity::Technician(id) => write!(f, "technician {id}"),
            Entity::Ticket(id) => write!(f, "ticket {id}"),
            Entity::Appointment(id) => write!(f, "appointment {id}"),
            Entity::Skill {
                technician_id,
                service_type,
            } => write!(f, "skill {service_type} of technician {technician_id}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnavailableReason
{
    Status(TechnicianStatus),
    WorkloadCeiling
    {
        workload: usize, max_workload: usize
    },
}

impl fmt::Display for UnavailableReason
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            UnavailableReason::Status(status) => write!(f, "status is {status:?}"),
            UnavailableReason::WorkloadCeiling { workload, max_workload } => {
                write!(f, "workload {workload} reached ceiling {max_workload}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchedulingError
{
    #[error("interval start {start} is not before end {end}")]
    InvalidInterval
    {
        start: Instant, end: Instant
    },
    #[error("technician {technician_id} is already booked by appointments {conflicting:?}")]
    SchedulingConflict
    {
        technician_id: TechnicianId,
        conflicting: Vec<AppointmentId>,
    },
    #[error("technician {technician_id} is not qualified for {service_type}")]
    SkillMismatch
    {
        technician_id: TechnicianId,
        service_type: ServiceType,
    },
    #[error("technician {technician_id} is unavailable: {reason}")]
    TechnicianUnavailable
    {
        technician_id: TechnicianId,
        reason: UnavailableReason,
    },
    #[error("technician {technician_id} already holds skill {service_type}")]
    DuplicateSkillAssignment
    {
        technician_id: TechnicianId,
        service_type: ServiceType,
    },
    #[error("no qualified technician available for {service_type}")]
    NoQualifiedTechnician
    {
        service_type: ServiceType
    },
    #[error("{0} not found")]
    NotFound(Entity),
    #[error("{0} already exists")]
    AlreadyExists(Entity),
    #[error("appointment {appointment_id} cannot move from {from:?} to {to:?}")]
    InvalidStatusTransition
    {
        appointment_id: AppointmentId,
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("appointment {appointment_id} is {status:?} and can no longer be rescheduled")]
    AppointmentTerminal
    {
        appointment_id: AppointmentId,
        status: AppointmentStatus,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SchedulingError
{
    /// Conflicts and capacity rejections can succeed with another technician
    /// or another slot.
    pub fn is_retriable(&self) -> bool
    {
        matches!(
            self,
            SchedulingError::SchedulingConflict { .. }
                | SchedulingError::TechnicianUnavailable {
                    reason: UnavailableReason::WorkloadCeiling { .. },
                    ..
                }
        )
    }
}

impl From<InvalidInterval> for SchedulingError
{
    fn from(value: InvalidInterval) -> Self
    {
        SchedulingError::InvalidInterval {
            start: value.start,
            end: value.end,
        }
    }
}

impl From<StoreError> for SchedulingError
{
    fn from(value: StoreError) -> Self
    {
        match value {
            StoreError::TechnicianMissing(id) => SchedulingError::NotFound(Entity::Technician(id)),
            StoreError::TicketMissing(id) => SchedulingError::NotFound(Entity::Ticket(id)),
            StoreError::AppointmentMissing(id) => SchedulingError::NotFound(Entity::Appointment(id)),
            StoreError::TechnicianDuplicate(id) => SchedulingError::AlreadyExists(Entity::Technician(id)),
            StoreError::TicketDuplicate(id) => SchedulingError::AlreadyExists(Entity::Ticket(id)),
            StoreError::SkillDuplicate {
                technician_id,
                service_type,
            } => SchedulingError::DuplicateSkillAssignment {
                technician_id,
                service_type,
            },
            StoreError::SkillMissing {
                technician_id,
                service_type,
            } => SchedulingError::NotFound(Entity::Skill {
                technician_id,
                service_type,
            }),
        }
    }
}
