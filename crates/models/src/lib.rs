use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ticket price in whole rupiah.
///
/// The booking service reports `ticket_price` and expects `gross_amount` in
/// this unit. Decoding accepts an integer, a float with no fractional part,
/// or a string of digits; anything else, and any amount that is not
/// positive, is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAmount", into = "i64")]
pub struct Rupiah(pub i64);

impl Rupiah {
    pub fn amount(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Rupiah {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rp{}", self.0)
    }
}

impl From<Rupiah> for i64 {
    fn from(r: Rupiah) -> Self {
        r.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(i64),
    Float(f64),
    Text(String),
}

impl TryFrom<RawAmount> for Rupiah {
    type Error = String;

    fn try_from(raw: RawAmount) -> Result<Self, Self::Error> {
        let n = match raw {
            RawAmount::Int(n) => n,
            RawAmount::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            RawAmount::Float(f) => return Err(format!("price {f} is not a whole rupiah amount")),
            RawAmount::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("price {s:?} is not a whole rupiah amount"))?,
        };
        if n <= 0 {
            return Err(format!("price {n} must be positive"));
        }
        Ok(Rupiah(n))
    }
}

/// Reservation status as reported by the booking service.
///
/// Only `Available` and `Completed` carry meaning on the client; every other
/// value is kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketStatus {
    Available,
    Completed,
    Other(String),
}

impl From<String> for TicketStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Available" => TicketStatus::Available,
            "Completed" => TicketStatus::Completed,
            _ => TicketStatus::Other(s),
        }
    }
}

impl From<TicketStatus> for String {
    fn from(s: TicketStatus) -> Self {
        s.to_string()
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Available => write!(f, "Available"),
            TicketStatus::Completed => write!(f, "Completed"),
            TicketStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Read-only snapshot of a ticket, replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    pub id: String,
    pub movie_name: Option<String>,
    pub theater_name: Option<String>,
    pub showtime: Option<String>,
    pub seat_number: Option<String>,
    pub price: Rupiah,
    pub status: Option<TicketStatus>,
}

/// Payment instructions for a transaction the service has created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSession {
    pub order_id: String,
    pub va_number: String,
}

/// What the presentation layer renders for one ticket view.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    Loading,
    Ready(Ticket),
    PaymentPending(PaymentSession),
    Failed(String),
}

/// How the payment workflow treats an availability reply that is neither
/// a 400 rejection nor the confirmation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedAvailability {
    /// End in `Failed` with an "unexpected response" error.
    #[default]
    Fail,
    /// End in `NotAvailable`, reported to the caller without an error.
    Ignore,
}

impl FromStr for UnrecognizedAvailability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!("unknown availability policy: {other}")),
        }
    }
}
