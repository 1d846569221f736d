use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use predicates::prelude::*;
use serde_json::{Value, json};
use std::process::{Command, Output};

async fn booking_service(check: (StatusCode, Value)) -> String {
    let app = Router::new()
        .route(
            "/ticket-group/{id}",
            get(|| async {
                Json(json!({
                    "movie_name": "Dune: Part Two",
                    "theater_name": "Studio 3",
                    "showtime": "2026-10-17T19:30:00",
                    "seat_number": "F7",
                    "ticket_price": 50000,
                    "status": "Available"
                }))
            })
            .delete(|| async { Json(json!({ "message": "Ticket deleted" })) }),
        )
        .route(
            "/payments/check-ticket-status",
            post(move || async move { (check.0, Json(check.1)) }),
        )
        .route(
            "/transaction/create-transaction",
            post(|| async {
                Json(json!({
                    "order_id": "ORD1",
                    "transaction": { "va_numbers": [{ "va_number": "8808123456" }] }
                }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn available() -> (StatusCode, Value) {
    (StatusCode::OK, json!({ "message": "Ticket is available for booking." }))
}

/// Run the binary off the runtime thread so the mock service keeps serving.
async fn run(args: Vec<String>) -> Output {
    let home = tempfile::tempdir().unwrap();
    tokio::task::spawn_blocking(move || {
        Command::new(cargo_bin!("cinepay"))
            .args(&args)
            .env("HOME", home.path())
            .env_remove("CINEPAY_API_URL")
            .env_remove("CINEPAY_TOKEN")
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn show_prints_ticket_card() {
    let url = booking_service(available()).await;

    run(args(&["show", "T1", "--api-url", &url]))
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Dune: Part Two"))
        .stdout(predicate::str::contains("Rp50000"))
        .stdout(predicate::str::contains("F7"));
}

#[tokio::test]
async fn pay_prints_virtual_account() {
    let url = booking_service(available()).await;

    run(args(&["pay", "T1", "--api-url", &url, "--token", "secret"]))
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("ORD1"))
        .stdout(predicate::str::contains("8808123456"));
}

#[tokio::test]
async fn pay_reports_rejection_and_fails() {
    let url = booking_service((
        StatusCode::BAD_REQUEST,
        json!({ "message": "Ticket already booked." }),
    ))
    .await;

    run(args(&["pay", "T1", "--api-url", &url]))
        .await
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ticket already booked."))
        .stdout(predicate::str::contains("8808123456").not());
}

#[tokio::test]
async fn cancel_confirms_deletion() {
    let url = booking_service(available()).await;

    run(args(&["cancel", "T1", "--api-url", &url]))
        .await
        .assert()
        .success()
        .stdout(predicate::str::contains("Ticket T1 deleted."));
}

#[test]
fn help_lists_commands() {
    Command::new(cargo_bin!("cinepay"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pay"))
        .stdout(predicate::str::contains("cancel"));
}
