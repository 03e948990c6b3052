//! Request authentication guard.
//!
//! Resolves the bearer token into an authenticated identity and re-resolves
//! the user row on every request, so a deleted account is denied even while
//! its token is still within the signature/expiry window.

use axum::{
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum::extract::FromRequestParts;
use sea_orm::EntityTrait;

use crate::{
    db::{entities::user, enums::Role},
    error::{AppError, Result},
    state::AppState,
};

/// Authenticated identity attached to the request after the guard passes.
/// Handlers read identity from here and nowhere else.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i32,
    pub role: Role,
}

impl CurrentUser {
    /// Policy gate for album mutation. Kept on the identity type so every
    /// mutating album handler consults the same check.
    pub fn ensure_album_manager(&self) -> Result<()> {
        if self.role.can_manage_albums() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only artists can manage albums".to_string(),
            ))
        }
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let auth_header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Authentication("Authorization header missing".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Authentication("Invalid authorization header".to_string()))?;

    let claims = state.auth.verify_token(token)?;

    // Freshness check: the token may outlive the account.
    let user_row = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    request.extensions_mut().insert(CurrentUser {
        id: user_row.id,
        role: Role::from_str(&user_row.role),
    });

    Ok(next.run(request).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or_else(|| AppError::Authentication("Not authenticated".to_string()))
    }
}
