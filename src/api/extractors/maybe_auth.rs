use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::auth::Principal;
use crate::api::extractors::auth::authenticate;
use std::sync::Arc;
use tracing::debug;

/// Optional identity for public routes. A bad or expired token is treated as a guest.
pub struct MaybeAuthUser(pub Option<Principal>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        match authenticate(parts, &app_state) {
            Ok(principal) => Ok(MaybeAuthUser(principal)),
            Err(status) => {
                debug!("MaybeAuth: treating request as guest ({})", status);
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
