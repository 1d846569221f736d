use cinepay_client::{BookingClient, StatusCode};
use tracing::{info, warn};

use crate::cell::{Phase, StateCell};
use crate::error::CancelError;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum CancelState {
    #[default]
    Idle,
    Deleting,
    Deleted,
    Failed(CancelError),
}

impl Phase for CancelState {
    fn is_in_flight(&self) -> bool {
        matches!(self, CancelState::Deleting)
    }
}

impl CancelState {
    pub fn is_in_flight(&self) -> bool {
        Phase::is_in_flight(self)
    }
}

/// Deletes a reserved ticket. Single step, no retries.
#[derive(Debug)]
pub struct Cancellation {
    client: BookingClient,
    state: StateCell<CancelState>,
}

impl Cancellation {
    pub fn new(client: BookingClient) -> Self {
        Self {
            client,
            state: StateCell::default(),
        }
    }

    pub fn state(&self) -> CancelState {
        self.state.get()
    }

    pub fn reset(&self) {
        if !self.state.get().is_in_flight() {
            self.state.set(CancelState::Idle);
        }
    }

    /// Delete `ticket_id`. Only HTTP 200 counts as deleted.
    ///
    /// Returns `None` if a deletion is already in flight.
    pub async fn cancel(&self, ticket_id: &str) -> Option<Result<(), CancelError>> {
        let run = self.state.begin(CancelState::Deleting)?;

        let result = self.delete(ticket_id).await;
        match &result {
            Ok(()) => {
                info!("Ticket {ticket_id} deleted");
                run.finish(CancelState::Deleted);
            }
            Err(e) => {
                warn!("Deleting ticket {ticket_id} failed: {e}");
                run.finish(CancelState::Failed(e.clone()));
            }
        }
        Some(result)
    }

    async fn delete(&self, ticket_id: &str) -> Result<(), CancelError> {
        let reply = self
            .client
            .delete_ticket(ticket_id)
            .await
            .map_err(|e| CancelError::Transport(e.to_string()))?;

        if reply.status == StatusCode::OK {
            return Ok(());
        }

        let message = reply
            .message()
            .unwrap_or_else(|| "Failed to delete ticket".to_string());
        Err(CancelError::Rejected(message))
    }
}
