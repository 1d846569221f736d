use std::sync::Mutex;

use cinepay_client::{BookingClient, TicketRecord};
use cinepay_models::Ticket;
use tracing::{debug, info, warn};

use crate::cell::lock;
use crate::error::LoadError;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready(Ticket),
    Failed(LoadError),
}

impl LoadState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        match self {
            LoadState::Ready(ticket) => Some(ticket),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    state: LoadState,
    generation: u64,
}

/// Fetches the ticket record for the view.
///
/// Every call re-fetches. When loads overlap only the latest one may write
/// the state; an older response that arrives late is discarded.
#[derive(Debug)]
pub struct TicketLoader {
    client: BookingClient,
    slot: Mutex<Slot>,
}

impl TicketLoader {
    pub fn new(client: BookingClient) -> Self {
        Self {
            client,
            slot: Mutex::new(Slot::default()),
        }
    }

    pub fn state(&self) -> LoadState {
        lock(&self.slot).state.clone()
    }

    /// Fetch `ticket_id` and move to `Ready` or `Failed`.
    ///
    /// Returns `None` without touching the network for an empty id, and
    /// `None` when a newer load superseded this one.
    pub async fn load(&self, ticket_id: &str) -> Option<Result<Ticket, LoadError>> {
        if ticket_id.is_empty() {
            debug!("No ticket id, nothing to load");
            return None;
        }

        let generation = {
            let mut slot = lock(&self.slot);
            slot.generation += 1;
            slot.state = LoadState::Loading;
            slot.generation
        };
        let pending = Pending { slot: &self.slot, generation };

        let result = self.fetch(ticket_id).await;

        let mut slot = lock(&self.slot);
        if slot.generation != generation {
            debug!("Discarding stale response for ticket {ticket_id}");
            return None;
        }
        slot.state = match &result {
            Ok(ticket) => LoadState::Ready(ticket.clone()),
            Err(e) => LoadState::Failed(e.clone()),
        };
        drop(slot);
        drop(pending);

        Some(result)
    }

    async fn fetch(&self, ticket_id: &str) -> Result<Ticket, LoadError> {
        let reply = self.client.fetch_ticket(ticket_id).await.map_err(|e| {
            warn!("Error fetching ticket {ticket_id}: {e}");
            LoadError::Unavailable
        })?;

        if let Some(message) = reply.message() {
            info!("Ticket {ticket_id} rejected by service ({}): {message}", reply.status);
            return Err(LoadError::Rejected(message));
        }

        let record: TicketRecord = reply.json().map_err(|e| {
            warn!("Unreadable ticket record for {ticket_id}: {e}");
            LoadError::Unavailable
        })?;

        info!("Loaded ticket {ticket_id}");
        Ok(record.into_ticket(ticket_id))
    }
}

/// Resets a load that never completed (its future was dropped).
struct Pending<'a> {
    slot: &'a Mutex<Slot>,
    generation: u64,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        let mut slot = lock(self.slot);
        if slot.generation == self.generation && slot.state.is_in_flight() {
            slot.state = LoadState::Idle;
        }
    }
}
