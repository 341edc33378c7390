mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestApp;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;

#[tokio::test]
async fn test_purchase_creates_booking_tickets_and_reserves_inventory() {
    let app = TestApp::new().await;
    let organizer = app.organizer().await;
    let buyer = app.register("Bella").await;

    let event_id = app.published_event(&organizer, Utc::now() + Duration::days(10)).await;
    let tt_id = app.create_ticket_type(&organizer, &event_id, 50, json!({})).await;

    let (status, body) = app.purchase(&buyer, &event_id, &tt_id, 2).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["total_amount"], 5000);
    assert_eq!(body["currency"], "USD");
    assert!(body["booking_reference"].as_str().unwrap().starts_with("PP"));

    let tickets = body["tickets"].as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    let numbers: HashSet<&str> = tickets.iter().map(|t| t["ticket_number"].as_str().unwrap()).collect();
    assert_eq!(numbers.len(), 2);
    for t in tickets {
        assert!(t["ticket_number"].as_str().unwrap().starts_with('T'));
        assert!(!t["qr_code"].as_str().unwrap().is_empty());
    }

    assert_eq!(app.sold_quantity(&tt_id).await, 2);

    // Booking starts pending/pending with both tickets attached.
    let booking_id = body["booking_id"].as_str().unwrap();
    let (status, details) = app.request("GET", &format!("/api/v1/tickets/bookings/{}", booking_id), Some(&buyer.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["booking"]["booking_status"], "pending");
    assert_eq!(details["booking"]["payment_status"], "pending");
    assert_eq!(details["tickets"].as_array().unwrap().len(), 2);

    let subjects = app.emails.subjects();
    assert_eq!(subjects.len(), 1);
    assert!(subjects[0].starts_with("Ticket Confirmation"));
}

#[tokio::test]
async fn test_last_seats_then_insufficient() {
    let app = TestApp::new().await;
    let organizer = app.organizer().await;
    let buyer = app.register("Bella").await;

    let event_id = app.published_event(&organizer, Utc::now() + Duration::days(10)).await;
    let tt_id = app.create_ticket_type(&organizer, &event_id, 10, json!({})).await;
    app.set_sold_quantity(&tt_id, 8).await;

    let (status, _) = app.purchase(&buyer, &event_id, &tt_id, 2).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(app.sold_quantity(&tt_id).await, 10);

    let (status, body) = app.purchase(&buyer, &event_id, &tt_id, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INSUFFICIENT_TICKETS");
    assert_eq!(body["message"], "Only 0 tickets available");
    assert_eq!(app.sold_quantity(&tt_id).await, 10);
}

#[tokio::test]
async fn test_attendee_count_must_match_quantity() {
    let app = TestApp::new().await;
    let organizer = app.organizer().await;
    let buyer = app.register("Bella").await;

    let event_id = app.published_event(&organizer, Utc::now() + Duration::days(10)).await;
    let tt_id = app.create_ticket_type(&organizer, &event_id, 10, json!({})).await;

    let (status, body) = app.request("POST", "/api/v1/tickets/purchase", Some(&buyer.token), Some(json!({
        "event_id": event_id,
        "ticket_type_id": tt_id,
        "quantity": 2,
        "attendee_details": [{ "name": "Only One", "email": "one@example.com" }],
    }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_ATTENDEE_DETAILS");
    assert_eq!(app.sold_quantity(&tt_id).await, 0);
}

#[tokio::test]
async fn test_zero_quantity_rejected() {
    let app = TestApp::new().await;
    let organizer = app.organizer().await;
    let buyer = app.register("Bella").await;

    let event_id = app.published_event(&organizer, Utc::now() + Duration::days(10)).await;
    let tt_id = app.create_ticket_type(&organizer, &event_id, 10, json!({})).await;

    let (status, _) = app.purchase(&buyer, &event_id, &tt_id, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_or_foreign_ticket_type() {
    let app = TestApp::new().await;
    let organizer = app.organizer().await;
    let buyer = app.register("Bella").await;

    let event_a = app.published_event(&organizer, Utc::now() + Duration::days(10)).await;
    let event_b = app.published_event(&organizer, Utc::now() + Duration::days(12)).await;
    let tt_b = app.create_ticket_type(&organizer, &event_b, 10, json!({})).await;

    let (status, body) = app.purchase(&buyer, &event_a, "does-not-exist", 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TICKET_TYPE_NOT_FOUND");

    // A ticket type of another event is not found for this one.
    let (status, body) = app.purchase(&buyer, &event_a, &tt_b, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TICKET_TYPE_NOT_FOUND");
    assert_eq!(app.sold_quantity(&tt_b).await, 0);
}

#[tokio::test]
async fn test_inactive_ticket_type_rejected() {
    let app = TestApp::new().await;
    let organizer = app.organizer().await;
    let buyer = app.register("Bella").await;

    let event_id = app.published_event(&organizer, Utc::now() + Duration::days(10)).await;
    let tt_id = app.create_ticket_type(&organizer, &event_id, 10, json!({})).await;

    let (status, body) = app.request(
        "PUT",
        &format!("/api/v1/ticket-types/{}/active", tt_id),
        Some(&organizer.token),
        Some(json!({ "is_active": false })),
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    let (status, body) = app.purchase(&buyer, &event_id, &tt_id, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "TICKET_TYPE_INACTIVE");
}

#[tokio::test]
async fn test_sales_window_is_enforced() {
    let app = TestApp::new().await;
    let organizer = app.organizer().await;
    let buyer = app.register("Bella").await;
    let now = Utc::now();

    let event_id = app.published_event(&organizer, now + Duration::days(30)).await;
    let not_started = app.create_ticket_type(&organizer, &event_id, 10, json!({
        "name": "Late Release",
        "sales_start_date": now + Duration::days(2),
    })).await;
    let ended = app.create_ticket_type(&organizer, &event_id, 10, json!({
        "name": "Early Bird",
        "sales_start_date": now - Duration::days(10),
        "sales_end_date": now - Duration::days(1),
    })).await;
    let open = app.create_ticket_type(&organizer, &event_id, 10, json!({
        "name": "Regular",
        "sales_start_date": now - Duration::days(1),
        "sales_end_date": now + Duration::days(1),
    })).await;

    let (status, body) = app.purchase(&buyer, &event_id, &not_started, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "SALES_NOT_STARTED");

    let (status, body) = app.purchase(&buyer, &event_id, &ended, 1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "SALES_ENDED");

    let (status, _) = app.purchase(&buyer, &event_id, &open, 1).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_purchase_requires_authentication() {
    let app = TestApp::new().await;
    let (status, _) = app.request("POST", "/api/v1/tickets/purchase", None, Some(json!({
        "event_id": "x",
        "ticket_type_id": "y",
        "quantity": 1,
        "attendee_details": [{ "name": "A", "email": "a@example.com" }],
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_purchases_cannot_oversell() {
    let app = Arc::new(TestApp::new().await);
    let organizer = app.organizer().await;
    let event_id = app.published_event(&organizer, Utc::now() + Duration::days(10)).await;
    let tt_id = app.create_ticket_type(&organizer, &event_id, 5, json!({})).await;

    let buyer = Arc::new(app.register("Bella").await);

    let mut set = JoinSet::new();
    for _ in 0..10 {
        let app = app.clone();
        let buyer = buyer.clone();
        let event_id = event_id.clone();
        let tt_id = tt_id.clone();
        set.spawn(async move { app.purchase(&buyer, &event_id, &tt_id, 1).await });
    }

    let mut succeeded = 0;
    let mut sold_out = 0;
    while let Some(result) = set.join_next().await {
        let (status, body) = result.unwrap();
        match status {
            StatusCode::CREATED => succeeded += 1,
            StatusCode::BAD_REQUEST => {
                assert_eq!(body["error"], "INSUFFICIENT_TICKETS");
                sold_out += 1;
            }
            other => panic!("unexpected status {}: {}", other, body),
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(sold_out, 5);
    assert_eq!(app.sold_quantity(&tt_id).await, 5);

    let tickets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE ticket_type_id = ?")
        .bind(&tt_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(tickets, 5);
}

#[tokio::test]
async fn test_sold_quantity_grows_by_n_times_q() {
    let app = TestApp::new().await;
    let organizer = app.organizer().await;
    let buyer = app.register("Bella").await;

    let event_id = app.published_event(&organizer, Utc::now() + Duration::days(10)).await;
    let tt_id = app.create_ticket_type(&organizer, &event_id, 100, json!({})).await;

    for _ in 0..4 {
        let (status, _) = app.purchase(&buyer, &event_id, &tt_id, 3).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(app.sold_quantity(&tt_id).await, 12);
}

#[tokio::test]
async fn test_out_of_range_total_is_rejected_without_reserving() {
    let app = TestApp::new().await;
    let organizer = app.organizer().await;
    let buyer = app.register("Bella").await;

    let event_id = app.published_event(&organizer, Utc::now() + Duration::days(10)).await;
    let tt_id = app.create_ticket_type(&organizer, &event_id, 10, json!({})).await;

    // Rows written before the price cap existed.
    sqlx::query("UPDATE ticket_types SET price = ? WHERE id = ?")
        .bind(i64::MAX)
        .bind(&tt_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let (status, body) = app.purchase(&buyer, &event_id, &tt_id, 2).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Booking total is out of range");
    assert_eq!(app.sold_quantity(&tt_id).await, 0);

    let bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE ticket_type_id = ?")
        .bind(&tt_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(bookings, 0);
}
