use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header, request::Parts, Method, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::auth::{Claims, Principal, TOKEN_AUDIENCE};
use crate::domain::models::user::Role;
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::{debug, Span};

pub struct AuthUser(pub Principal);

/// An authenticated Organizer or Admin.
pub struct OrganizerUser(pub Principal);

enum TokenSource {
    Bearer(String),
    Cookie(String),
}

fn find_token(parts: &Parts) -> Option<TokenSource> {
    if let Some(value) = parts.headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            return Some(TokenSource::Bearer(token.trim().to_string()));
        }
    }

    parts.extensions.get::<Cookies>()
        .and_then(|cookies| cookies.get("access_token"))
        .map(|c| TokenSource::Cookie(c.value().to_string()))
}

pub(crate) fn decode_claims(token: &str, app_state: &AppState) -> Result<Claims, StatusCode> {
    let decoding_key = DecodingKey::from_ed_pem(app_state.config.jwt_public_key.as_bytes())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_audience(&[TOKEN_AUDIENCE]);
    validation.set_issuer(&[app_state.config.auth_issuer.as_str()]);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Rejected access token: {}", e);
            StatusCode::UNAUTHORIZED
        })
}

fn principal_from(claims: &Claims) -> Result<Principal, StatusCode> {
    let role = claims.role.parse::<Role>().map_err(|_| StatusCode::UNAUTHORIZED)?;
    Ok(Principal { user_id: claims.sub.clone(), role })
}

/// Cookie sessions must echo the CSRF claim on state-changing requests.
fn check_csrf(parts: &Parts, claims: &Claims) -> Result<(), StatusCode> {
    let method = &parts.method;
    if *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS {
        return Ok(());
    }

    let csrf_header_val = parts.headers.get("X-CSRF-Token")
        .ok_or(StatusCode::FORBIDDEN)?
        .to_str()
        .map_err(|_| StatusCode::FORBIDDEN)?;

    if csrf_header_val != claims.csrf_token {
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(())
}

pub(crate) fn authenticate(parts: &Parts, app_state: &AppState) -> Result<Option<Principal>, StatusCode> {
    let Some(source) = find_token(parts) else {
        return Ok(None);
    };

    let principal = match source {
        TokenSource::Bearer(token) => {
            let claims = decode_claims(&token, app_state)?;
            principal_from(&claims)?
        }
        TokenSource::Cookie(token) => {
            let claims = decode_claims(&token, app_state)?;
            check_csrf(parts, &claims)?;
            principal_from(&claims)?
        }
    };

    Span::current().record("user_id", principal.user_id.as_str());
    Ok(Some(principal))
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        authenticate(parts, &app_state)?
            .map(AuthUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

impl<S> FromRequestParts<S> for OrganizerUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.role.can_manage_events() {
            debug!("User {} with role {} denied organizer route", principal.user_id, principal.role);
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(OrganizerUser(principal))
    }
}
