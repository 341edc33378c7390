use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::{AuthUser, OrganizerUser};
use crate::api::dtos::requests::{EntryRequest, VerifyQrRequest};
use crate::error::AppError;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub async fn validate_ticket(
    State(state): State<Arc<AppState>>,
    OrganizerUser(staff): OrganizerUser,
    Json(payload): Json<EntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let validation = state.ticket_service
        .validate_for_entry(&payload.ticket_number, &payload.event_id)
        .await?;

    info!("Entry check for {} by {}: valid={}", payload.ticket_number, staff.user_id, validation.valid);
    Ok(Json(validation))
}

pub async fn use_ticket(
    State(state): State<Arc<AppState>>,
    OrganizerUser(staff): OrganizerUser,
    Path(ticket_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.ticket_service.use_ticket(&ticket_id).await?;

    info!("Ticket {} admitted by {}", ticket.ticket_number, staff.user_id);
    Ok(Json(json!({
        "success": true,
        "message": "Ticket marked as used",
        "ticket": ticket,
    })))
}

pub async fn check_in(
    State(state): State<Arc<AppState>>,
    OrganizerUser(staff): OrganizerUser,
    Json(payload): Json<EntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.ticket_service.check_in(&payload.ticket_number, &payload.event_id).await?;

    info!("Ticket {} checked in by {}", ticket.ticket_number, staff.user_id);
    Ok(Json(json!({
        "success": true,
        "message": "Ticket checked in",
        "ticket": ticket,
    })))
}

pub async fn verify_qr(
    State(state): State<Arc<AppState>>,
    AuthUser(_user): AuthUser,
    Json(payload): Json<VerifyQrRequest>,
) -> Result<impl IntoResponse, AppError> {
    let verification = state.ticket_service.verify_qr(&payload.qr_data, payload.max_age_hours)?;
    Ok(Json(verification))
}
