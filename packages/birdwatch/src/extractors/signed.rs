use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::state::AppState;
use crate::utils::url_signer::LinkAction;

/// Marker for the action a [`SignedLink`] must have been issued for.
pub trait SignedAction: Send + Sync + 'static {
    const ACTION: LinkAction;
}

pub struct Edit;
pub struct Increment;
pub struct Capitalize;

impl SignedAction for Edit {
    const ACTION: LinkAction = LinkAction::Edit;
}
impl SignedAction for Increment {
    const ACTION: LinkAction = LinkAction::Increment;
}
impl SignedAction for Capitalize {
    const ACTION: LinkAction = LinkAction::Capitalize;
}

#[derive(Deserialize)]
struct SignatureQuery {
    #[serde(rename = "_signature")]
    signature: Option<String>,
}

/// An authenticated request whose `/{id}` path was signed by this server for
/// action `A` in the caller's current session.
///
/// Rejects with `SIGNATURE_INVALID` before the handler runs when the signature
/// is missing, forged, or belongs to another action, record or session.
pub struct SignedLink<A> {
    pub auth_user: AuthUser,
    pub record_id: i32,
    _action: PhantomData<A>,
}

impl<A: SignedAction> FromRequestParts<AppState> for SignedLink<A> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        let Path(record_id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let Query(query) = Query::<SignatureQuery>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::SignatureInvalid)?;
        let signature = query.signature.ok_or(AppError::SignatureInvalid)?;

        if !state
            .signer
            .verify(A::ACTION, record_id, &auth_user.session_id, &signature)
        {
            tracing::warn!(
                user_id = auth_user.user_id,
                record_id,
                action = A::ACTION.as_str(),
                "Rejected forged or foreign signed link"
            );
            return Err(AppError::SignatureInvalid);
        }

        Ok(SignedLink {
            auth_user,
            record_id,
            _action: PhantomData,
        })
    }
}
