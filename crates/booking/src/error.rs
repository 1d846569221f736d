use thiserror::Error;

/// Failure classes a user-visible error falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The service answered with a structured business-rule message.
    ServiceRejected,
    /// Network failure, or a body that could not be decoded.
    TransportFailure,
    /// The reply lacked a field the workflow needs.
    ProtocolMismatch,
    /// Non-2xx status with no usable message.
    HttpFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("{0}")]
    Rejected(String),
    #[error("Failed to fetch ticket")]
    Unavailable,
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::Rejected(_) => ErrorKind::ServiceRejected,
            LoadError::Unavailable => ErrorKind::TransportFailure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Rejected(String),
    #[error("Payment Error: {status} - {reason}")]
    Http { status: u16, reason: String },
    #[error("Transaction failed: no order identifier received")]
    MissingOrderId,
    /// The transaction exists server-side under `order_id`, but there is
    /// nothing to show the payer.
    #[error("Bank transfer details not available")]
    NoAccountNumber { order_id: String },
    #[error("Unexpected response from ticket status check: {0}")]
    UnexpectedAvailability(String),
    #[error("Error processing transaction: {0}")]
    Transport(String),
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::Rejected(_) => ErrorKind::ServiceRejected,
            PaymentError::Http { .. } => ErrorKind::HttpFailure,
            PaymentError::MissingOrderId
            | PaymentError::NoAccountNumber { .. }
            | PaymentError::UnexpectedAvailability(_) => ErrorKind::ProtocolMismatch,
            PaymentError::Transport(_) => ErrorKind::TransportFailure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CancelError {
    #[error("{0}")]
    Rejected(String),
    #[error("Error deleting ticket: {0}")]
    Transport(String),
}

impl CancelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CancelError::Rejected(_) => ErrorKind::ServiceRejected,
            CancelError::Transport(_) => ErrorKind::TransportFailure,
        }
    }
}
