use axum::{extract::{State, Path, Query}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::{
    requests::{BookingListQuery, CancelBookingRequest, ConfirmPaymentRequest, PurchaseTicketsRequest},
    responses::{PurchaseResponse, PurchasedTicket, TicketQrResponse},
};
use crate::domain::services::ticket_service::PurchaseRequest;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn purchase_tickets(
    State(state): State<Arc<AppState>>,
    AuthUser(buyer): AuthUser,
    Json(payload): Json<PurchaseTicketsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.ticket_service.purchase(&buyer, PurchaseRequest {
        event_id: payload.event_id,
        ticket_type_id: payload.ticket_type_id,
        quantity: payload.quantity,
        attendee_details: payload.attendee_details,
        payment_method: payload.payment_method,
        notes: payload.notes,
    }).await?;

    let response = PurchaseResponse {
        success: true,
        booking_id: result.booking.id.clone(),
        booking_reference: result.booking.booking_reference.clone(),
        tickets: result.tickets.iter().map(PurchasedTicket::from).collect(),
        total_amount: result.booking.total_amount,
        currency: result.booking.currency.clone(),
        message: "Tickets purchased successfully".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
    payload: Option<Json<ConfirmPaymentRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    let confirmed = state.ticket_service
        .confirm_payment(&actor, &booking_id, payload.payment_reference.as_deref())
        .await?;
    Ok(Json(confirmed))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
    payload: Option<Json<CancelBookingRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    let cancelled = state.ticket_service
        .cancel_booking(&actor, &booking_id, payload.reason.as_deref())
        .await?;

    info!("Booking {} cancelled by {}", cancelled.id, actor.user_id);
    Ok(Json(cancelled))
}

pub async fn list_user_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state.ticket_service.list_user_bookings(&actor, query.status.as_deref()).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let details = state.ticket_service.booking_details(&actor, &booking_id).await?;
    Ok(Json(details))
}

pub async fn list_user_tickets(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let tickets = state.ticket_service.list_user_tickets(&actor).await?;
    Ok(Json(tickets))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(ticket_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.ticket_service.ticket_details(&actor, &ticket_id).await?;
    Ok(Json(ticket))
}

pub async fn get_ticket_qr(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(ticket_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.ticket_service.ticket_by_number(&actor, &ticket_number).await?;

    Ok(Json(TicketQrResponse {
        verification_url: state.qr_service.verification_url(&ticket.ticket_number),
        ticket_number: ticket.ticket_number,
        qr_code: ticket.qr_code_data,
    }))
}
