use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::UpdateRoleRequest;
use crate::domain::models::user::Role;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    AuthUser(admin): AuthUser,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !admin.is_admin() {
        return Err(AppError::Forbidden("Admin role required".into()));
    }

    let role: Role = payload.role.parse().map_err(AppError::Validation)?;

    let updated = state.user_repo.update_role(&user_id, role.as_str()).await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    info!("Admin {} set role of user {} to {}", admin.user_id, updated.id, role);

    Ok(Json(updated))
}
