//! In-process stand-in for the booking service.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cinepay_booking::PaymentSettings;
use cinepay_client::{BookingClient, ClientConfig};
use cinepay_models::{Rupiah, Ticket};
use serde_json::{Value, json};

pub const TOKEN: &str = "test-token";

/// One canned response.
#[derive(Clone)]
pub struct Canned {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

impl Canned {
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body: body.to_string(), delay: None }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self { status, body: body.to_string(), delay: None }
    }

    pub fn delayed(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }
}

pub fn ticket_body() -> Value {
    json!({
        "movie_name": "Dune: Part Two",
        "theater_name": "Studio 3",
        "showtime": "2026-10-17T19:30:00",
        "seat_number": "F7",
        "ticket_price": 50000,
        "status": "Available"
    })
}

pub fn available() -> Canned {
    Canned::json(200, json!({ "message": "Ticket is available for booking." }))
}

pub fn transaction_created() -> Canned {
    Canned::json(
        200,
        json!({
            "order_id": "ORD1",
            "transaction": { "va_numbers": [{ "bank": "bca", "va_number": "8808123456" }] }
        }),
    )
}

/// Responses per endpoint. The n-th call gets the n-th entry; the last
/// entry repeats.
pub struct Script {
    pub fetch: Vec<Canned>,
    pub check: Vec<Canned>,
    pub create: Vec<Canned>,
    pub delete: Vec<Canned>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            fetch: vec![Canned::json(200, ticket_body())],
            check: vec![available()],
            create: vec![transaction_created()],
            delete: vec![Canned::json(200, json!({ "message": "Ticket deleted" }))],
        }
    }
}

impl Script {
    pub fn fetch(mut self, c: Canned) -> Self {
        self.fetch = vec![c];
        self
    }

    pub fn check(mut self, c: Canned) -> Self {
        self.check = vec![c];
        self
    }

    pub fn create(mut self, c: Canned) -> Self {
        self.create = vec![c];
        self
    }

    pub fn delete(mut self, c: Canned) -> Self {
        self.delete = vec![c];
        self
    }
}

#[derive(Default)]
struct Calls {
    fetch: AtomicUsize,
    check: AtomicUsize,
    create: AtomicUsize,
    delete: AtomicUsize,
}

struct Shared {
    script: Script,
    calls: Calls,
    last_check: Mutex<Option<Value>>,
    last_transaction: Mutex<Option<Value>>,
    last_auth: Mutex<Option<String>>,
    last_ticket_id: Mutex<Option<String>>,
}

pub struct MockBooking {
    pub base_url: String,
    shared: Arc<Shared>,
}

impl MockBooking {
    pub async fn start(script: Script) -> Self {
        let shared = Arc::new(Shared {
            script,
            calls: Calls::default(),
            last_check: Mutex::new(None),
            last_transaction: Mutex::new(None),
            last_auth: Mutex::new(None),
            last_ticket_id: Mutex::new(None),
        });

        let app = Router::new()
            .route("/ticket-group/{id}", get(fetch_ticket).delete(delete_ticket))
            .route("/payments/check-ticket-status", post(check_status))
            .route("/transaction/create-transaction", post(create_transaction))
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url: format!("http://{addr}"), shared }
    }

    pub fn client(&self) -> BookingClient {
        client_for(&self.base_url)
    }

    pub fn fetch_calls(&self) -> usize {
        self.shared.calls.fetch.load(Ordering::SeqCst)
    }

    pub fn check_calls(&self) -> usize {
        self.shared.calls.check.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.shared.calls.create.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.shared.calls.delete.load(Ordering::SeqCst)
    }

    pub fn last_check(&self) -> Option<Value> {
        self.shared.last_check.lock().unwrap().clone()
    }

    pub fn last_transaction(&self) -> Option<Value> {
        self.shared.last_transaction.lock().unwrap().clone()
    }

    pub fn last_auth(&self) -> Option<String> {
        self.shared.last_auth.lock().unwrap().clone()
    }

    /// Ticket id of the last fetch or delete, as decoded from the path.
    pub fn last_ticket_id(&self) -> Option<String> {
        self.shared.last_ticket_id.lock().unwrap().clone()
    }
}

pub fn client_for(base_url: &str) -> BookingClient {
    BookingClient::new(&ClientConfig {
        base_url: base_url.to_string(),
        auth_token: Some(TOKEN.to_string()),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

/// Base URL of a port nothing listens on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn ticket() -> Ticket {
    Ticket {
        id: "T1".to_string(),
        movie_name: Some("Dune: Part Two".to_string()),
        theater_name: Some("Studio 3".to_string()),
        showtime: Some("2026-10-17T19:30:00".to_string()),
        seat_number: Some("F7".to_string()),
        price: Rupiah(50000),
        status: None,
    }
}

pub fn settings() -> PaymentSettings {
    PaymentSettings::default()
}

// --- Handlers ---

async fn fetch_ticket(
    State(s): State<Arc<Shared>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_auth(&s, &headers);
    *s.last_ticket_id.lock().unwrap() = Some(id);
    let n = s.calls.fetch.fetch_add(1, Ordering::SeqCst);
    respond(&s.script.fetch, n).await
}

async fn delete_ticket(
    State(s): State<Arc<Shared>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_auth(&s, &headers);
    *s.last_ticket_id.lock().unwrap() = Some(id);
    let n = s.calls.delete.fetch_add(1, Ordering::SeqCst);
    respond(&s.script.delete, n).await
}

async fn check_status(
    State(s): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&s, &headers);
    *s.last_check.lock().unwrap() = Some(body);
    let n = s.calls.check.fetch_add(1, Ordering::SeqCst);
    respond(&s.script.check, n).await
}

async fn create_transaction(
    State(s): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&s, &headers);
    *s.last_transaction.lock().unwrap() = Some(body);
    let n = s.calls.create.fetch_add(1, Ordering::SeqCst);
    respond(&s.script.create, n).await
}

fn record_auth(s: &Shared, headers: &HeaderMap) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *s.last_auth.lock().unwrap() = auth;
}

async fn respond(script: &[Canned], n: usize) -> Response {
    let canned = &script[n.min(script.len() - 1)];
    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }
    (
        StatusCode::from_u16(canned.status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        canned.body.clone(),
    )
        .into_response()
}
