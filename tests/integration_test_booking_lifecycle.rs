mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{TestApp, TestUser};
use serde_json::{json, Value};

async fn booked(app: &TestApp, available: i32, quantity: usize) -> (TestUser, TestUser, String, String) {
    let organizer = app.organizer().await;
    let buyer = app.register("Bella").await;
    let event_id = app.published_event(&organizer, Utc::now() + Duration::days(10)).await;
    let tt_id = app.create_ticket_type(&organizer, &event_id, available, json!({})).await;

    let (status, body) = app.purchase(&buyer, &event_id, &tt_id, quantity).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let booking_id = body["booking_id"].as_str().unwrap().to_string();
    (organizer, buyer, tt_id, booking_id)
}

async fn confirm(app: &TestApp, user: &TestUser, booking_id: &str, body: Option<Value>) -> (StatusCode, Value) {
    app.request("POST", &format!("/api/v1/tickets/bookings/{}/confirm", booking_id), Some(&user.token), body).await
}

async fn cancel(app: &TestApp, user: &TestUser, booking_id: &str, body: Option<Value>) -> (StatusCode, Value) {
    app.request("POST", &format!("/api/v1/tickets/bookings/{}/cancel", booking_id), Some(&user.token), body).await
}

#[tokio::test]
async fn test_confirm_payment_marks_paid_and_sends_ticket_email() {
    let app = TestApp::new().await;
    let (_, buyer, tt_id, booking_id) = booked(&app, 10, 2).await;

    let (status, body) = confirm(&app, &buyer, &booking_id, Some(json!({ "payment_reference": "PAY-123" }))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["booking"]["booking_status"], "confirmed");
    assert_eq!(body["booking"]["payment_status"], "paid");
    assert_eq!(body["booking"]["payment_reference"], "PAY-123");
    assert_eq!(body["tickets"].as_array().unwrap().len(), 2);

    // Inventory is not touched by confirmation.
    assert_eq!(app.sold_quantity(&tt_id).await, 2);

    let sent = app.emails.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].subject.starts_with("Your Digital Tickets"));
    assert_eq!(sent[1].attachments.len(), 2);
}

#[tokio::test]
async fn test_confirm_twice_conflicts() {
    let app = TestApp::new().await;
    let (_, buyer, _, booking_id) = booked(&app, 10, 1).await;

    let (status, _) = confirm(&app, &buyer, &booking_id, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = confirm(&app, &buyer, &booking_id, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_releases_inventory_once() {
    let app = TestApp::new().await;
    let (_, buyer, tt_id, booking_id) = booked(&app, 10, 3).await;
    assert_eq!(app.sold_quantity(&tt_id).await, 3);

    let (status, body) = cancel(&app, &buyer, &booking_id, Some(json!({ "reason": "Change of plans" }))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["booking_status"], "cancelled");
    assert_eq!(body["payment_status"], "refunded");
    assert!(body["notes"].as_str().unwrap().contains("Cancellation reason: Change of plans"));
    assert_eq!(app.sold_quantity(&tt_id).await, 0);

    let (status, _) = cancel(&app, &buyer, &booking_id, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.sold_quantity(&tt_id).await, 0);

    // Tickets survive cancellation.
    let tickets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE booking_id = ?")
        .bind(&booking_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(tickets, 3);
}

#[tokio::test]
async fn test_cancel_after_confirm_restores_inventory() {
    let app = TestApp::new().await;
    let (_, buyer, tt_id, booking_id) = booked(&app, 10, 2).await;

    let (status, _) = confirm(&app, &buyer, &booking_id, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = cancel(&app, &buyer, &booking_id, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking_status"], "cancelled");
    assert_eq!(body["payment_status"], "refunded");
    assert_eq!(app.sold_quantity(&tt_id).await, 0);

    // A cancelled booking cannot be confirmed.
    let (status, _) = confirm(&app, &buyer, &booking_id, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_only_owner_or_admin_can_change_booking() {
    let app = TestApp::new().await;
    let (organizer, _, tt_id, booking_id) = booked(&app, 10, 1).await;
    let stranger = app.register("Sam").await;

    let (status, _) = confirm(&app, &stranger, &booking_id, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = cancel(&app, &organizer, &booking_id, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.sold_quantity(&tt_id).await, 1);

    let admin = app.admin().await;
    let (status, _) = cancel(&app, &admin, &booking_id, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.sold_quantity(&tt_id).await, 0);
}

#[tokio::test]
async fn test_unknown_booking_is_not_found() {
    let app = TestApp::new().await;
    let buyer = app.register("Bella").await;

    let (status, _) = confirm(&app, &buyer, "missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = cancel(&app, &buyer, "missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_email_failure_does_not_roll_back() {
    let app = TestApp::with_failing_email().await;
    let (_, buyer, tt_id, booking_id) = booked(&app, 10, 2).await;
    assert_eq!(app.sold_quantity(&tt_id).await, 2);

    let (status, body) = confirm(&app, &buyer, &booking_id, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["booking_status"], "confirmed");
}

#[tokio::test]
async fn test_booking_and_ticket_reads() {
    let app = TestApp::new().await;
    let (organizer, buyer, _, booking_id) = booked(&app, 10, 2).await;
    let stranger = app.register("Sam").await;

    let (status, body) = app.request("GET", "/api/v1/tickets/bookings/user", Some(&buyer.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app.request("GET", "/api/v1/tickets/bookings/user?status=confirmed", Some(&buyer.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = app.request("GET", "/api/v1/tickets/bookings/user?status=bogus", Some(&buyer.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, tickets) = app.request("GET", "/api/v1/tickets/user/tickets", Some(&buyer.token), None).await;
    assert_eq!(status, StatusCode::OK);
    let tickets = tickets.as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    let ticket_id = tickets[0]["id"].as_str().unwrap();
    let ticket_number = tickets[0]["ticket_number"].as_str().unwrap();

    let (status, body) = app.request("GET", &format!("/api/v1/tickets/{}", ticket_id), Some(&buyer.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking_id"], booking_id.as_str());

    let (status, body) = app.request("GET", &format!("/api/v1/tickets/qr/{}", ticket_number), Some(&buyer.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["verification_url"],
        format!("https://paradisepay.test/verify-ticket/{}", ticket_number)
    );
    assert!(!body["qr_code"].as_str().unwrap().is_empty());

    // Strangers are refused; event staff may read.
    let (status, _) = app.request("GET", &format!("/api/v1/tickets/{}", ticket_id), Some(&stranger.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.request("GET", &format!("/api/v1/tickets/bookings/{}", booking_id), Some(&stranger.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.request("GET", &format!("/api/v1/tickets/bookings/{}", booking_id), Some(&organizer.token), None).await;
    assert_eq!(status, StatusCode::OK);
}
