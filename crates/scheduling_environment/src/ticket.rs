use serde::Deserialize;
use serde::Serialize;

use crate::ActorId;
use crate::ClientId;
use crate::HistoryId;
use crate::Instant;
use crate::ServiceType;
use crate::TicketId;

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Ord, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus
{
    #[default]
    Open,
    Closed,
}

impl TicketStatus
{
    pub fn is_terminal(self) -> bool
    {
        self == TicketStatus::Closed
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket
{
    ticket_id: TicketId,
    client_id: ClientId,
    service_type: ServiceType,
    status: TicketStatus,
    due_at: Option<Instant>,
}

impl Ticket
{
    pub fn new(ticket_id: TicketId, client_id: ClientId, service_type: ServiceType) -> Self
    {
        Self {
            ticket_id,
            client_id,
            service_type,
            status: TicketStatus::Open,
            due_at: None,
        }
    }

    pub fn with_due_at(mut self, due_at: Instant) -> Self
    {
        self.due_at = Some(due_at);
        self
    }

    pub fn with_status(mut self, status: TicketStatus) -> Self
    {
        self.status = status;
        self
    }

    pub fn id(&self) -> TicketId
    {
        self.ticket_id
    }

    pub fn client_id(&self) -> ClientId
    {
        self.client_id
    }

    pub fn service_type(&self) -> ServiceType
    {
        self.service_type
    }

    pub fn status(&self) -> TicketStatus
    {
        self.status
    }

    pub fn due_at(&self) -> Option<Instant>
    {
        self.due_at
    }

    pub fn is_overdue(&self, now: Instant) -> bool
    {
        self.status == TicketStatus::Open && self.due_at.is_some_and(|due_at| due_at < now)
    }

    pub(crate) fn set_status(&mut self, status: TicketStatus)
    {
        self.status = status;
    }
}

/// One recorded ticket status change. Entries are only ever appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketHistory
{
    history_id: HistoryId,
    ticket_id: TicketId,
    status: TicketStatus,
    timestamp: Instant,
    actor: ActorId,
}

impl TicketHistory
{
    pub(crate) fn new(history_id: HistoryId, ticket_id: TicketId, status: TicketStatus, timestamp: Instant, actor: ActorId) -> Self
    {
        Self {
            history_id,
            ticket_id,
            status,
            timestamp,
            actor,
        }
    }

    pub fn id(&self) -> HistoryId
    {
        self.history_id
    }

    pub fn ticket_id(&self) -> TicketId
    {
        self.ticket_id
    }

    pub fn status(&self) -> TicketStatus
    {
        self.status
    }

    pub fn timestamp(&self) -> Instant
    {
        self.timestamp
    }

    pub fn actor(&self) -> ActorId
    {
        self.actor
    }
}
