/**
 * Authentication Middleware
 *
 * Extracts the bearer credential from the Authorization header, verifies
 * it against the identity provider's shared secret, and resolves it to a
 * local user record. A valid token whose identity has never been seen
 * before provisions a new user row (name defaults to the email local
 * part). The resolved identity is attached to request extensions.
 */

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::token::verify_token;
use crate::error::ApiError;
use crate::server::state::AppState;
use crate::users::{db as users_db, UserRole};

/// Authenticated identity attached to every protected request
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

    let claims = verify_token(token, &state.config.jwt_secret).map_err(|e| {
        tracing::warn!("token verification failed: {e}");
        ApiError::unauthorized("Invalid or expired token")
    })?;

    // Resolve the external identity to a local user, provisioning on first sight
    let user = match users_db::get_user_by_external_id(&state.pool, &claims.sub).await? {
        Some(user) => user,
        None => {
            let name = claims
                .name
                .clone()
                .unwrap_or_else(|| claims.email.split('@').next().unwrap_or("user").to_string());
            tracing::info!("provisioning new user for identity {}", claims.sub);
            users_db::create_user(
                &state.pool,
                &claims.sub,
                &claims.email,
                &name,
                claims.picture.as_deref(),
            )
            .await?
        }
    };

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        external_id: user.external_id,
        email: user.email,
        name: user.name,
        role: user.role,
    });

    Ok(next.run(request).await)
}

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Not authenticated"))
    }
}
