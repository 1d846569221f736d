use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use cinepay_client::BookingClient;
use cinepay_models::{PaymentSession, Ticket, WorkflowState};
use tokio::sync::mpsc;
use tracing::debug;

use crate::cancel::{CancelState, Cancellation};
use crate::cell::lock;
use crate::error::{CancelError, LoadError};
use crate::loader::{LoadState, TicketLoader};
use crate::payment::{PaymentOutcome, PaymentSettings, PaymentState, PaymentWorkflow};

/// Signals for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Show the payment instructions for a created transaction.
    OpenPaymentDetails(PaymentSession),
    /// Close the ticket view. Sent at most once per view.
    Close,
}

/// One open ticket view: loader, payment workflow and cancellation for a
/// single ticket id, plus the error banner they share.
///
/// Closing the view does not abort requests in flight; their results still
/// update the per-operation state but no longer reach the event channel or
/// the error banner.
#[derive(Debug)]
pub struct TicketView {
    ticket_id: String,
    loader: TicketLoader,
    payment: PaymentWorkflow,
    cancellation: Cancellation,
    error: Mutex<Option<String>>,
    closed: AtomicBool,
    events: mpsc::UnboundedSender<ViewEvent>,
}

impl TicketView {
    pub fn new(
        ticket_id: impl Into<String>,
        client: BookingClient,
        settings: PaymentSettings,
    ) -> (Self, mpsc::UnboundedReceiver<ViewEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let view = Self {
            ticket_id: ticket_id.into(),
            loader: TicketLoader::new(client.clone()),
            payment: PaymentWorkflow::new(client.clone(), settings),
            cancellation: Cancellation::new(client),
            error: Mutex::new(None),
            closed: AtomicBool::new(false),
            events,
        };
        (view, rx)
    }

    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    pub fn loader(&self) -> &TicketLoader {
        &self.loader
    }

    pub fn payment(&self) -> &PaymentWorkflow {
        &self.payment
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    pub fn ticket(&self) -> Option<Ticket> {
        self.loader.state().ticket().cloned()
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.error).clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Collapse the per-operation states into what the view shows.
    ///
    /// Any operation in flight shows `Loading`; then the error banner, then
    /// an open payment session, then the loaded ticket.
    pub fn state(&self) -> WorkflowState {
        let load = self.loader.state();
        let payment = self.payment.state();
        let cancel = self.cancellation.state();

        if load.is_in_flight() || payment.is_in_flight() || cancel.is_in_flight() {
            return WorkflowState::Loading;
        }
        if let Some(message) = self.error() {
            return WorkflowState::Failed(message);
        }
        if let PaymentState::Resolved(session) = payment {
            return WorkflowState::PaymentPending(session);
        }
        match load {
            LoadState::Ready(ticket) => WorkflowState::Ready(ticket),
            _ => WorkflowState::Idle,
        }
    }

    pub async fn load(&self) -> Option<Result<Ticket, LoadError>> {
        if self.ticket_id.is_empty() {
            return None;
        }
        self.clear_error();

        let result = self.loader.load(&self.ticket_id).await?;
        if let Err(e) = &result {
            self.show_error(e.to_string());
        }
        Some(result)
    }

    /// Start the payment workflow for the loaded ticket.
    ///
    /// Ignored (returns `None`) when no ticket is loaded or a payment is
    /// already in flight.
    pub async fn pay(&self) -> Option<PaymentOutcome> {
        let Some(ticket) = self.ticket() else {
            debug!("Pay requested before ticket {} was loaded", self.ticket_id);
            return None;
        };
        if self.payment.state().is_in_flight() {
            return None;
        }
        self.clear_error();

        let outcome = self.payment.pay(&ticket).await?;
        match &outcome {
            PaymentOutcome::Resolved(session) => {
                self.emit(ViewEvent::OpenPaymentDetails(session.clone()));
            }
            PaymentOutcome::Failed(e) => self.show_error(e.to_string()),
            PaymentOutcome::NotAvailable(_) => {}
        }
        Some(outcome)
    }

    /// Delete the ticket; on success the view closes.
    pub async fn cancel(&self) -> Option<Result<(), CancelError>> {
        if self.cancellation.state().is_in_flight() {
            return None;
        }
        self.clear_error();

        let result = self.cancellation.cancel(&self.ticket_id).await?;
        match &result {
            Ok(()) => self.close(),
            Err(e) => self.show_error(e.to_string()),
        }
        Some(result)
    }

    /// Dismissing the error banner also closes the view.
    pub fn dismiss_error(&self) {
        self.clear_error();
        if matches!(self.payment.state(), PaymentState::Failed(_)) {
            self.payment.reset();
        }
        if matches!(self.cancellation.state(), CancelState::Failed(_)) {
            self.cancellation.reset();
        }
        self.close();
    }

    /// The payment-detail view was closed by the user.
    pub fn close_payment_details(&self) {
        if matches!(self.payment.state(), PaymentState::Resolved(_)) {
            self.payment.reset();
        }
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closing view for ticket {}", self.ticket_id);
            let _ = self.events.send(ViewEvent::Close);
        }
    }

    fn emit(&self, event: ViewEvent) {
        if self.is_closed() {
            debug!("View closed, dropping {event:?}");
            return;
        }
        let _ = self.events.send(event);
    }

    fn show_error(&self, message: String) {
        if !self.is_closed() {
            *lock(&self.error) = Some(message);
        }
    }

    fn clear_error(&self) {
        *lock(&self.error) = None;
    }
}
