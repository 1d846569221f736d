use cinepay_client::{
    BookingClient, ClientError, CreateTransaction, PaymentDetails, StatusCode, StatusReply,
    TransactionReply,
};
use cinepay_models::{PaymentSession, Ticket, UnrecognizedAvailability};
use tracing::{info, warn};

use crate::cell::{Phase, Run, StateCell};
use crate::error::PaymentError;

/// Availability reply that allows the workflow to create a transaction.
pub const AVAILABLE_FOR_BOOKING: &str = "Ticket is available for booking.";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PaymentState {
    #[default]
    Idle,
    Checking,
    CreatingTransaction,
    Resolved(PaymentSession),
    NotAvailable(String),
    Failed(PaymentError),
}

impl Phase for PaymentState {
    fn is_in_flight(&self) -> bool {
        matches!(self, PaymentState::Checking | PaymentState::CreatingTransaction)
    }
}

impl PaymentState {
    pub fn is_in_flight(&self) -> bool {
        Phase::is_in_flight(self)
    }
}

/// Terminal result of one payment run.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Resolved(PaymentSession),
    /// The availability check answered with an unrecognized message and
    /// the workflow is configured to stop without an error.
    NotAvailable(String),
    Failed(PaymentError),
}

impl From<PaymentOutcome> for PaymentState {
    fn from(outcome: PaymentOutcome) -> Self {
        match outcome {
            PaymentOutcome::Resolved(session) => PaymentState::Resolved(session),
            PaymentOutcome::NotAvailable(message) => PaymentState::NotAvailable(message),
            PaymentOutcome::Failed(e) => PaymentState::Failed(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentSettings {
    /// Payment channel selector sent as `bank`.
    pub bank: String,
    pub unrecognized_availability: UnrecognizedAvailability,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            bank: "bca".to_string(),
            unrecognized_availability: UnrecognizedAvailability::Fail,
        }
    }
}

/// Availability check → transaction creation → virtual-account extraction.
#[derive(Debug)]
pub struct PaymentWorkflow {
    client: BookingClient,
    settings: PaymentSettings,
    state: StateCell<PaymentState>,
}

impl PaymentWorkflow {
    pub fn new(client: BookingClient, settings: PaymentSettings) -> Self {
        Self {
            client,
            settings,
            state: StateCell::default(),
        }
    }

    pub fn state(&self) -> PaymentState {
        self.state.get()
    }

    /// Return a finished run to `Idle`. No effect while a run is in flight.
    pub fn reset(&self) {
        if !self.state.get().is_in_flight() {
            self.state.set(PaymentState::Idle);
        }
    }

    /// Run the workflow for `ticket`.
    ///
    /// Returns `None`, with no network call, if a run is already in flight.
    pub async fn pay(&self, ticket: &Ticket) -> Option<PaymentOutcome> {
        let Some(run) = self.state.begin(PaymentState::Checking) else {
            info!("Payment for ticket {} already in progress, ignoring", ticket.id);
            return None;
        };

        let outcome = match self.steps(ticket, &run).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Payment for ticket {} failed: {e}", ticket.id);
                PaymentOutcome::Failed(e)
            }
        };

        run.finish(outcome.clone().into());
        Some(outcome)
    }

    async fn steps(
        &self,
        ticket: &Ticket,
        run: &Run<'_, PaymentState>,
    ) -> Result<PaymentOutcome, PaymentError> {
        let reply = self
            .client
            .check_ticket_status(&ticket.id)
            .await
            .map_err(transport)?;
        let status: StatusReply = reply.json().map_err(transport)?;

        if reply.status == StatusCode::BAD_REQUEST {
            let message = status
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| reply.status_line());
            return Err(PaymentError::Rejected(message));
        }

        if status.message.as_deref() != Some(AVAILABLE_FOR_BOOKING) {
            let message = status.message.unwrap_or_else(|| reply.status_line());
            return match self.settings.unrecognized_availability {
                UnrecognizedAvailability::Fail => {
                    Err(PaymentError::UnexpectedAvailability(message))
                }
                UnrecognizedAvailability::Ignore => {
                    info!("Ticket {} not available for booking: {message}", ticket.id);
                    Ok(PaymentOutcome::NotAvailable(message))
                }
            };
        }

        run.advance(PaymentState::CreatingTransaction);

        let request = CreateTransaction {
            ticket_id: ticket.id.clone(),
            gross_amount: ticket.price,
            bank: self.settings.bank.clone(),
        };
        let reply = self
            .client
            .create_transaction(&request)
            .await
            .map_err(transport)?;

        if !reply.is_success() {
            return Err(PaymentError::Http {
                status: reply.status.as_u16(),
                reason: reply.status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let tx: TransactionReply = reply.json().map_err(transport)?;
        let order_id = tx
            .order_id()
            .ok_or(PaymentError::MissingOrderId)?
            .to_string();

        match tx.payment_details() {
            PaymentDetails::BankTransfer { va_number } => {
                info!("Order {order_id} created for ticket {}", ticket.id);
                Ok(PaymentOutcome::Resolved(PaymentSession { order_id, va_number }))
            }
            PaymentDetails::NoAccountNumber => {
                warn!(
                    "Order {order_id} exists for ticket {} but carries no virtual account number",
                    ticket.id
                );
                Err(PaymentError::NoAccountNumber { order_id })
            }
        }
    }
}

fn transport(e: ClientError) -> PaymentError {
    PaymentError::Transport(e.to_string())
}
