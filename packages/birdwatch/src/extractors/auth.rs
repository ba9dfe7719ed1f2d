use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use sea_orm::EntityTrait;

use crate::entity::session;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. The token must
/// verify and its session must still exist and be unexpired.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub session_id: String,
}

impl AuthUser {
    /// Identity stamped on, and used to filter, the user's records.
    pub fn identity(&self) -> &str {
        &self.email
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        let live = session::Entity::find_by_id(claims.sid.clone())
            .one(&state.db)
            .await?
            .is_some_and(|s| s.user_id == claims.uid && s.expires_at > Utc::now());
        if !live {
            tracing::debug!(session_id = %claims.sid, "Rejected token for ended session");
            return Err(AppError::TokenInvalid);
        }

        Ok(AuthUser {
            user_id: claims.uid,
            email: claims.sub,
            session_id: claims.sid,
        })
    }
}
