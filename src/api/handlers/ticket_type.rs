use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, maybe_auth::MaybeAuthUser};
use crate::api::dtos::requests::{CreateTicketTypeRequest, SetActiveRequest};
use crate::api::handlers::event::{ensure_event_owner, find_visible_event};
use crate::domain::models::ticket_type::{NewTicketTypeParams, TicketType, MAX_TICKET_PRICE};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_ticket_type(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<CreateTicketTypeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_repo.find_event(&event_id).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;
    ensure_event_owner(&actor, &event)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if payload.price < 0 {
        return Err(AppError::Validation("Price cannot be negative".into()));
    }
    if payload.price > MAX_TICKET_PRICE {
        return Err(AppError::Validation(format!("Price cannot exceed {}", MAX_TICKET_PRICE)));
    }
    if payload.available_quantity < 0 {
        return Err(AppError::Validation("Available quantity cannot be negative".into()));
    }
    if payload.max_per_user.is_some_and(|m| m < 1) {
        return Err(AppError::Validation("max_per_user must be at least 1".into()));
    }
    if let (Some(start), Some(end)) = (payload.sales_start_date, payload.sales_end_date) {
        if end < start {
            return Err(AppError::Validation("Sales end must be after sales start".into()));
        }
    }

    let ticket_type = TicketType::new(NewTicketTypeParams {
        event_id: event.id.clone(),
        name: payload.name.trim().to_string(),
        description: payload.description,
        price: payload.price,
        currency: payload.currency.map(|c| c.trim().to_uppercase()),
        available_quantity: payload.available_quantity,
        max_per_user: payload.max_per_user,
        sales_start_date: payload.sales_start_date,
        sales_end_date: payload.sales_end_date,
    });

    let created = state.event_repo.create_ticket_type(&ticket_type).await?;
    info!("Ticket type {} ({}) added to event {}", created.id, created.name, event.id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_ticket_types(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_visible_event(&state, viewer.as_ref(), &event_id).await?;

    let is_owner = viewer.as_ref().is_some_and(|p| ensure_event_owner(p, &event).is_ok());
    let ticket_types = state.event_repo.list_ticket_types(&event.id, !is_owner).await?;

    Ok(Json(ticket_types))
}

pub async fn set_ticket_type_active(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(ticket_type_id): Path<String>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ticket_type = state.event_repo.find_ticket_type(&ticket_type_id).await?
        .ok_or(AppError::NotFound("Ticket type not found".into()))?;
    let event = state.event_repo.find_event(&ticket_type.event_id).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;
    ensure_event_owner(&actor, &event)?;

    let updated = state.event_repo.set_ticket_type_active(&ticket_type.id, payload.is_active).await?
        .ok_or(AppError::NotFound("Ticket type not found".into()))?;

    info!("Ticket type {} active={}", updated.id, updated.is_active);
    Ok(Json(updated))
}
