use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{admin, auth, entry, event, health, ticket, ticket_type};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/me", get(auth::me))

        // Admin
        .route("/api/v1/admin/users/{user_id}/role", put(admin::update_user_role))

        // Events
        .route("/api/v1/events", post(event::create_event).get(event::list_events))
        .route("/api/v1/events/{event_id}", get(event::get_event))
        .route("/api/v1/events/{event_id}/status", put(event::update_event_status))
        .route("/api/v1/events/{event_id}/share-qr", get(event::share_qr))

        // Ticket types
        .route("/api/v1/events/{event_id}/ticket-types", post(ticket_type::create_ticket_type).get(ticket_type::list_ticket_types))
        .route("/api/v1/ticket-types/{ticket_type_id}/active", put(ticket_type::set_ticket_type_active))

        // Purchase & bookings
        .route("/api/v1/tickets/purchase", post(ticket::purchase_tickets))
        .route("/api/v1/tickets/bookings/user", get(ticket::list_user_bookings))
        .route("/api/v1/tickets/bookings/{booking_id}", get(ticket::get_booking))
        .route("/api/v1/tickets/bookings/{booking_id}/confirm", post(ticket::confirm_payment))
        .route("/api/v1/tickets/bookings/{booking_id}/cancel", post(ticket::cancel_booking))
        .route("/api/v1/tickets/user/tickets", get(ticket::list_user_tickets))
        .route("/api/v1/tickets/qr/{ticket_number}", get(ticket::get_ticket_qr))

        // Entry
        .route("/api/v1/tickets/validate", post(entry::validate_ticket))
        .route("/api/v1/tickets/check-in", post(entry::check_in))
        .route("/api/v1/tickets/verify-qr", post(entry::verify_qr))
        .route("/api/v1/tickets/{ticket_id}", get(ticket::get_ticket))
        .route("/api/v1/tickets/{ticket_id}/use", post(entry::use_ticket))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
