use serde::Deserialize;
use serde::Serialize;

use crate::AppointmentId;
use crate::Interval;
use crate::ServiceType;
use crate::TechnicianId;
use crate::TicketId;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Ord, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus
{
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus
{
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    /// Statuses that no longer occupy the technician's calendar.
    pub const TERMINAL: [AppointmentStatus; 3] = [AppointmentStatus::Cancelled, AppointmentStatus::Completed, AppointmentStatus::NoShow];

    pub fn is_terminal(self) -> bool
    {
        Self::TERMINAL.contains(&self)
    }

    /// Pending and confirmed appointments count towards workload and block
    /// overlapping bookings.
    pub fn is_active(self) -> bool
    {
        !self.is_terminal()
    }

    pub fn can_transition_to(self, next: AppointmentStatus) -> bool
    {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, NoShow) | (Confirmed, Cancelled)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment
{
    appointment_id: AppointmentId,
    technician_id: TechnicianId,
    ticket_id: TicketId,
    // Copied from the ticket at booking time, tickets never change service type.
    service_type: ServiceType,
    interval: Interval,
    status: AppointmentStatus,
}

impl Appointment
{
    pub fn new(
        appointment_id: AppointmentId,
        technician_id: TechnicianId,
        ticket_id: TicketId,
        service_type: ServiceType,
        interval: Interval,
        status: AppointmentStatus,
    ) -> Self
    {
        Self {
            appointment_id,
            technician_id,
            ticket_id,
            service_type,
            interval,
            status,
        }
    }

    pub fn id(&self) -> AppointmentId
    {
        self.appointment_id
    }

    pub fn technician_id(&self) -> TechnicianId
    {
        self.technician_id
    }

    pub fn ticket_id(&self) -> TicketId
    {
        self.ticket_id
    }

    pub fn service_type(&self) -> ServiceType
    {
        self.service_type
    }

    pub fn interval(&self) -> &Interval
    {
        &self.interval
    }

    pub fn status(&self) -> AppointmentStatus
    {
        self.status
    }

    pub fn is_active(&self) -> bool
    {
        self.status.is_active()
    }

    pub(crate) fn set_status(&mut self, status: AppointmentStatus)
    {
        self.status = status;
    }

    pub(crate) fn set_interval(&mut self, interval: Interval)
    {
        self.interval = interval;
    }
}

#[cfg(test)]
mod tests
{
    use super::AppointmentStatus;
    use super::AppointmentStatus::*;

    #[test]
    fn test_terminal_statuses()
    {
        assert!(Pending.is_active());
        assert!(Confirmed.is_active());
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(NoShow.is_terminal());
    }

    #[test]
    fn test_lifecycle_transitions()
    {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(NoShow));
        assert!(!Confirmed.can_transition_to(Pending));

        for terminal in AppointmentStatus::TERMINAL {
            for next in AppointmentStatus::ALL {
                assert!(!terminal.can_transition_to(next), "{terminal:?} -> {next:?}");
            }
        }
    }
}
