use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::{auth::{AuthUser, OrganizerUser}, maybe_auth::MaybeAuthUser};
use crate::api::dtos::{
    requests::{CreateEventRequest, UpdateEventStatusRequest},
    responses::ShareQrResponse,
};
use crate::domain::models::{
    auth::Principal,
    event::{Event, EventStatus, NewEventParams},
};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    OrganizerUser(organizer): OrganizerUser,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".into()));
    }
    if payload.venue_name.trim().is_empty() {
        return Err(AppError::Validation("Venue name is required".into()));
    }

    let event = Event::new(NewEventParams {
        organizer_id: organizer.user_id.clone(),
        title: payload.title.trim().to_string(),
        description: payload.description,
        venue_name: payload.venue_name,
        venue_address: payload.venue_address,
        city: payload.city,
        country: payload.country,
        event_date: payload.event_date,
    });

    let created = state.event_repo.create_event(&event).await?;
    info!("Event {} created by organizer {}", created.id, organizer.user_id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let events = state.event_repo.list_published().await?;
    Ok(Json(events))
}

pub async fn get_event(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_visible_event(&state, viewer.as_ref(), &event_id).await?;
    Ok(Json(event))
}

pub async fn update_event_status(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<UpdateEventStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status: EventStatus = payload.status.parse().map_err(AppError::Validation)?;

    let event = state.event_repo.find_event(&event_id).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;
    ensure_event_owner(&actor, &event)?;

    let updated = state.event_repo.update_event_status(&event.id, status.as_str()).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    info!("Event {} moved from {} to {}", updated.id, event.status, updated.status);
    Ok(Json(updated))
}

pub async fn share_qr(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_visible_event(&state, viewer.as_ref(), &event_id).await?;

    let url = state.qr_service.event_share_url(&event.id);
    let qr_code = state.qr_service.render(&url)?;

    Ok(Json(ShareQrResponse { url, qr_code }))
}

/// Published events are public. Drafts and closed events are only visible to
/// their organizer and admins.
pub(crate) async fn find_visible_event(
    state: &AppState,
    viewer: Option<&Principal>,
    event_id: &str,
) -> Result<Event, AppError> {
    let event = state.event_repo.find_event(event_id).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    let privileged = viewer.is_some_and(|p| p.user_id == event.organizer_id || p.is_admin());
    if !event.is_published() && !privileged {
        return Err(AppError::NotFound("Event not found".into()));
    }
    Ok(event)
}

pub(crate) fn ensure_event_owner(actor: &Principal, event: &Event) -> Result<(), AppError> {
    if actor.user_id == event.organizer_id || actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only the event organizer can manage this event".into()))
    }
}
