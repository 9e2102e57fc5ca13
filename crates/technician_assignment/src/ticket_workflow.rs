use scheduling_environment::ActorId;
use scheduling_environment::Instant;
use scheduling_environment::TicketId;
use scheduling_environment::store::SchedulingStore;
use scheduling_environment::ticket::TicketHistory;
use scheduling_environment::ticket::TicketStatus;
use tracing::info;

use crate::error::Result;

/// Ticket status changes. Each requested change, including one to the
/// current status, appends exactly one history entry.
pub struct TicketWorkflow<'a>
{
    store: &'a SchedulingStore,
}

impl<'a> TicketWorkflow<'a>
{
    pub fn new(store: &'a SchedulingStore) -> Self
    {
        Self { store }
    }

    pub fn change_status(&self, ticket_id: TicketId, status: TicketStatus, actor: ActorId, at: Instant) -> Result<TicketHistory>
    {
        let previous = self.store.ticket(ticket_id)?.status();
        let entry = self.store.record_ticket_status(ticket_id, status, actor, at)?;
        info!(ticket_id, ?previous, ?status, actor, history_id = entry.id(), "ticket status changed");
        Ok(entry)
    }

    pub fn close(&self, ticket_id: TicketId, actor: ActorId, at: Instant) -> Result<TicketHistory>
    {
        self.change_status(ticket_id, TicketStatus::Closed, actor, at)
    }

    pub fn reopen(&self, ticket_id: TicketId, actor: ActorId, at: Instant) -> Result<TicketHistory>
    {
        self.change_status(ticket_id, TicketStatus::Open, actor, at)
    }

    pub fn history(&self, ticket_id: TicketId) -> Result<Vec<TicketHistory>>
    {
        self.store.ticket(ticket_id)?;
        Ok(self.store.history_for(ticket_id))
    }
}

#[cfg(test)]
mod tests
{
    use chrono::TimeZone;
    use chrono::Utc;
    use scheduling_environment::ServiceType;
    use scheduling_environment::store::SchedulingStore;
    use scheduling_environment::ticket::Ticket;
    use scheduling_environment::ticket::TicketStatus;

    use super::TicketWorkflow;
    use crate::error::Entity;
    use crate::error::SchedulingError;

    #[test]
    fn test_every_change_is_recorded()
    {
        let store = SchedulingStore::new();
        store.add_ticket(Ticket::new(1, 10, ServiceType::Network)).unwrap();
        let workflow = TicketWorkflow::new(&store);

        let t0 = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        workflow.change_status(1, TicketStatus::Open, 5, t0).unwrap();
        workflow.close(1, 6, t0 + chrono::Duration::hours(2)).unwrap();
        workflow.reopen(1, 5, t0 + chrono::Duration::hours(3)).unwrap();

        let history = workflow.history(1).unwrap();
        assert_eq!(
            history.iter().map(|entry| entry.status()).collect::<Vec<_>>(),
            vec![TicketStatus::Open, TicketStatus::Closed, TicketStatus::Open]
        );
        assert_eq!(store.ticket(1).unwrap().status(), TicketStatus::Open);
        assert_eq!(workflow.history(2), Err(SchedulingError::NotFound(Entity::Ticket(2))));
    }
}
