use std::time::Duration;

use cinepay_models::{Rupiah, Ticket, TicketStatus};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

pub use reqwest::StatusCode;

const TICKET_GROUP_PATH: &[&str] = &["ticket-group"];
const CHECK_TICKET_STATUS_PATH: &[&str] = &["payments", "check-ticket-status"];
const CREATE_TRANSACTION_PATH: &[&str] = &["transaction", "create-transaction"];

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid ticket id {0:?}")]
    InvalidTicketId(String),
    #[error("invalid booking service URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

// --- Booking service response types ---

/// Ticket record as served by `GET /ticket-group/{id}`.
#[derive(Debug, Deserialize)]
pub struct TicketRecord {
    #[serde(default)]
    movie_name: Option<String>,
    #[serde(default)]
    theater_name: Option<String>,
    #[serde(default)]
    showtime: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    seat_number: Option<String>,
    ticket_price: Rupiah,
    #[serde(default)]
    status: Option<TicketStatus>,
}

impl TicketRecord {
    pub fn into_ticket(self, id: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            movie_name: self.movie_name,
            theater_name: self.theater_name,
            showtime: self.showtime,
            seat_number: self.seat_number,
            price: self.ticket_price,
            status: self.status,
        }
    }
}

/// Reply of `POST /payments/check-ticket-status`. Only a JSON object
/// decodes; its `message` is kept when it is a string.
#[derive(Debug, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct StatusReply {
    pub message: Option<String>,
}

impl From<Map<String, Value>> for StatusReply {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            message: map.get("message").and_then(Value::as_str).map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTransaction {
    pub ticket_id: String,
    pub gross_amount: Rupiah,
    pub bank: String,
}

/// Reply of `POST /transaction/create-transaction`.
///
/// The payment detail is nested, and any level of it may be missing or of
/// another shape. It is kept as raw JSON so that a malformed detail never
/// loses the order id; callers go through
/// [`TransactionReply::payment_details`].
#[derive(Debug, Deserialize)]
pub struct TransactionReply {
    #[serde(default, deserialize_with = "lenient_string")]
    order_id: Option<String>,
    #[serde(default)]
    transaction: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentDetails {
    BankTransfer { va_number: String },
    NoAccountNumber,
}

impl TransactionReply {
    /// Non-empty order identifier, if the service sent one.
    pub fn order_id(&self) -> Option<&str> {
        self.order_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Account number of the first virtual-account record. Any other shape
    /// is `NoAccountNumber`.
    pub fn payment_details(&self) -> PaymentDetails {
        let va_number = self
            .transaction
            .as_ref()
            .and_then(|t| t.get("va_numbers"))
            .and_then(Value::as_array)
            .and_then(|accounts| accounts.first())
            .and_then(|account| account.get("va_number"))
            .and_then(|va| match va {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|va| !va.is_empty());

        match va_number {
            Some(va_number) => PaymentDetails::BankTransfer { va_number },
            None => PaymentDetails::NoAccountNumber,
        }
    }
}

/// Accepts a JSON string or number; identifiers come back as either.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

// --- Replies ---

/// Status and raw body of one booking service response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Top-level `message` of a JSON object body, when non-empty.
    pub fn message(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        value
            .get("message")?
            .as_str()
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }

    /// `"<code> - <reason phrase>"`, e.g. `"502 - Bad Gateway"`.
    pub fn status_line(&self) -> String {
        format!(
            "{} - {}",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("")
        )
    }
}

// --- Client ---

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

/// Authenticated HTTP client for the booking service.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct BookingClient {
    http: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl BookingClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };
        let base_url = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".to_string()));
        }

        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url,
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    pub async fn fetch_ticket(&self, ticket_id: &str) -> Result<Reply, ClientError> {
        let url = self.ticket_url(ticket_id)?;
        self.send(self.request(Method::GET, url)).await
    }

    pub async fn check_ticket_status(&self, ticket_id: &str) -> Result<Reply, ClientError> {
        let body = serde_json::json!({ "ticket_id": ticket_id });
        let url = self.url(CHECK_TICKET_STATUS_PATH, None);
        self.send(self.request(Method::POST, url).json(&body)).await
    }

    pub async fn create_transaction(&self, tx: &CreateTransaction) -> Result<Reply, ClientError> {
        let url = self.url(CREATE_TRANSACTION_PATH, None);
        self.send(self.request(Method::POST, url).json(tx)).await
    }

    pub async fn delete_ticket(&self, ticket_id: &str) -> Result<Reply, ClientError> {
        let url = self.ticket_url(ticket_id)?;
        self.send(self.request(Method::DELETE, url)).await
    }

    /// `/ticket-group/{id}`. Ids that cannot stand as a single path segment
    /// are refused instead of silently addressing another resource.
    fn ticket_url(&self, ticket_id: &str) -> Result<Url, ClientError> {
        if matches!(ticket_id, "" | "." | "..") {
            return Err(ClientError::InvalidTicketId(ticket_id.to_string()));
        }
        Ok(self.url(TICKET_GROUP_PATH, Some(ticket_id)))
    }

    /// Endpoint URL under the base path. The ticket id becomes exactly one
    /// percent-encoded segment, so `/`, `?` and `#` in it stay inside it.
    fn url(&self, path: &[&str], ticket_id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path);
            if let Some(id) = ticket_id {
                segments.push(id);
            }
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{method} {url}");
        let req = self.http.request(method, url);
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Reply, ClientError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        debug!("← {status} ({} bytes)", body.len());
        Ok(Reply { status, body })
    }
}
