//! Ticket view operations against the booking service.
//!
//! Each operation owns its own state machine:
//!
//! - [`TicketLoader`] fetches the ticket record shown in the view.
//! - [`PaymentWorkflow`] runs availability check → transaction creation →
//!   virtual-account extraction.
//! - [`Cancellation`] deletes the reserved ticket.
//!
//! [`TicketView`] composes the three for one ticket and projects them onto
//! the [`WorkflowState`](cinepay_models::WorkflowState) a presentation layer
//! renders.

mod cancel;
mod cell;
mod error;
mod loader;
mod payment;
mod view;

pub use cancel::{CancelState, Cancellation};
pub use error::{CancelError, ErrorKind, LoadError, PaymentError};
pub use loader::{LoadState, TicketLoader};
pub use payment::{
    AVAILABLE_FOR_BOOKING, PaymentOutcome, PaymentSettings, PaymentState, PaymentWorkflow,
};
pub use view::{TicketView, ViewEvent};
