use std::collections::HashMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::*;
use tracing::instrument;

use crate::entity::bird;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::form::AppForm;
use crate::extractors::signed::{Capitalize, Edit, Increment, SignedLink};
use crate::models::bird::*;
use crate::models::form::{FormView, validate};
use crate::routes::BIRDS_BASE;
use crate::state::AppState;
use crate::utils::url_signer::LinkAction;

fn to_listing() -> Redirect {
    Redirect::to(BIRDS_BASE)
}

/// Load a sighting the caller may act on. With ownership enforced, someone
/// else's record is indistinguishable from a missing one.
async fn find_actionable<C: ConnectionTrait>(
    db: &C,
    state: &AppState,
    auth_user: &AuthUser,
    id: i32,
) -> Result<Option<bird::Model>, AppError> {
    let mut select = bird::Entity::find_by_id(id);
    if state.config.birds.enforce_ownership {
        select = select.filter(bird::Column::OwnerIdentity.eq(auth_user.identity()));
    }
    Ok(select.one(db).await?)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Birds",
    operation_id = "listBirds",
    summary = "List the caller's sightings",
    description = "Returns every sighting logged by the authenticated user, each with signed edit, increment and capitalize links bound to the current session. Order is not guaranteed.",
    responses(
        (status = 200, description = "Caller's sightings", body = BirdListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_birds(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<BirdListResponse>, AppError> {
    let rows = bird::Entity::find()
        .filter(bird::Column::OwnerIdentity.eq(auth_user.identity()))
        .order_by_asc(bird::Column::Id)
        .all(&state.db)
        .await?;

    let sid = auth_user.session_id.as_str();
    let data = rows
        .into_iter()
        .map(|m| {
            let links = BirdLinks {
                edit: state.signer.signed_path(BIRDS_BASE, LinkAction::Edit, m.id, sid),
                increment: state
                    .signer
                    .signed_path(BIRDS_BASE, LinkAction::Increment, m.id, sid),
                capitalize: state
                    .signer
                    .signed_path(BIRDS_BASE, LinkAction::Capitalize, m.id, sid),
            };
            BirdResponse::new(m, links)
        })
        .collect();

    Ok(Json(BirdListResponse {
        data,
        add_url: format!("{BIRDS_BASE}/add"),
    }))
}

#[utoipa::path(
    get,
    path = "/add",
    tag = "Birds",
    operation_id = "newBirdForm",
    summary = "Blank sighting form",
    responses(
        (status = 200, description = "Empty form", body = FormView),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = auth_user.user_id))]
pub async fn add_form(auth_user: AuthUser) -> Json<FormView> {
    Json(FormView::blank(BIRD_FORM))
}

#[utoipa::path(
    post,
    path = "/add",
    tag = "Birds",
    operation_id = "createBird",
    summary = "Log a new sighting",
    description = "Takes a form-encoded body with `species_name`, `weight`, `diet`, `habitat` and `sighting_count`. The owner is always the caller; an owner field in the body is ignored. On success redirects to the listing. Resubmitting creates a duplicate.",
    responses(
        (status = 303, description = "Created; redirect to the listing"),
        (status = 400, description = "Form rejected, echoed back with field errors (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, submitted), fields(user_id = auth_user.user_id))]
pub async fn create_bird(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppForm(submitted): AppForm<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let form = validate(BIRD_FORM, &submitted);
    let input = BirdInput::try_from(&form)?;

    let now = chrono::Utc::now();
    let new_bird = bird::ActiveModel {
        species_name: Set(input.species_name),
        weight: Set(input.weight),
        diet: Set(input.diet),
        habitat: Set(input.habitat),
        sighting_count: Set(input.sighting_count),
        owner_identity: Set(auth_user.identity().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_bird.insert(&state.db).await?;
    tracing::info!(bird_id = model.id, "Logged sighting");

    Ok(to_listing())
}

#[utoipa::path(
    get,
    path = "/edit/{id}",
    tag = "Birds",
    operation_id = "editBirdForm",
    summary = "Sighting form pre-filled for editing",
    description = "Requires a signed edit link. An unknown id redirects to the listing without further detail.",
    params(
        ("id" = i32, Path, description = "Bird ID"),
        ("_signature" = String, Query, description = "Signature from the listing's edit link"),
    ),
    responses(
        (status = 200, description = "Pre-filled form", body = FormView),
        (status = 303, description = "Unknown record; redirect to the listing"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Bad signed link (SIGNATURE_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, link), fields(id = link.record_id))]
pub async fn edit_form(
    link: SignedLink<Edit>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let Some(model) = find_actionable(&state.db, &state, &link.auth_user, link.record_id).await?
    else {
        return Ok(to_listing().into_response());
    };

    Ok(Json(prefilled_form(&model)).into_response())
}

#[utoipa::path(
    post,
    path = "/edit/{id}",
    tag = "Birds",
    operation_id = "updateBird",
    summary = "Overwrite a sighting",
    description = "Requires a signed edit link. Takes the same form body as creation and overwrites every editable field; the id and owner never change. An unknown id redirects to the listing and changes nothing.",
    params(
        ("id" = i32, Path, description = "Bird ID"),
        ("_signature" = String, Query, description = "Signature from the listing's edit link"),
    ),
    responses(
        (status = 303, description = "Updated, or unknown record; redirect to the listing"),
        (status = 400, description = "Form rejected, echoed back with field errors (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Bad signed link (SIGNATURE_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, link, submitted), fields(id = link.record_id))]
pub async fn update_bird(
    link: SignedLink<Edit>,
    State(state): State<AppState>,
    AppForm(submitted): AppForm<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let txn = state.db.begin().await?;

    let Some(existing) = find_actionable(&txn, &state, &link.auth_user, link.record_id).await?
    else {
        return Ok(to_listing());
    };

    let form = validate(BIRD_FORM, &submitted);
    let input = BirdInput::try_from(&form)?;

    let mut active: bird::ActiveModel = existing.into();
    active.species_name = Set(input.species_name);
    active.weight = Set(input.weight);
    active.diet = Set(input.diet);
    active.habitat = Set(input.habitat);
    active.sighting_count = Set(input.sighting_count);
    active.updated_at = Set(chrono::Utc::now());

    active.update(&txn).await?;
    txn.commit().await?;

    Ok(to_listing())
}

#[utoipa::path(
    get,
    path = "/capitalize/{id}",
    tag = "Birds",
    operation_id = "capitalizeBird",
    summary = "Capitalize a sighting's species name",
    description = "Requires a signed capitalize link. Upper-cases the first character of the species name and leaves the rest as is. Does not redirect. An unknown id is a no-op.",
    params(
        ("id" = i32, Path, description = "Bird ID"),
        ("_signature" = String, Query, description = "Signature from the listing's capitalize link"),
    ),
    responses(
        (status = 204, description = "Done"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Bad signed link (SIGNATURE_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, link), fields(id = link.record_id))]
pub async fn capitalize_bird(
    link: SignedLink<Capitalize>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let txn = state.db.begin().await?;

    let Some(existing) = find_actionable(&txn, &state, &link.auth_user, link.record_id).await?
    else {
        tracing::debug!("Capitalize on unknown record ignored");
        return Ok(StatusCode::NO_CONTENT);
    };

    let capitalized = capitalize(&existing.species_name);
    if capitalized != existing.species_name {
        let mut active: bird::ActiveModel = existing.into();
        active.species_name = Set(capitalized);
        active.updated_at = Set(chrono::Utc::now());
        active.update(&txn).await?;
    }
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/inc/{id}",
    tag = "Birds",
    operation_id = "incrementBird",
    summary = "Add one to a sighting's count",
    description = "Requires a signed increment link. Applied as a single atomic update, so concurrent increments are never lost. An unknown id changes nothing. Always redirects to the listing.",
    params(
        ("id" = i32, Path, description = "Bird ID"),
        ("_signature" = String, Query, description = "Signature from the listing's increment link"),
    ),
    responses(
        (status = 303, description = "Redirect to the listing"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Bad signed link (SIGNATURE_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, link), fields(id = link.record_id))]
pub async fn increment_bird(
    link: SignedLink<Increment>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let mut update = bird::Entity::update_many()
        .col_expr(
            bird::Column::SightingCount,
            Expr::col(bird::Column::SightingCount).add(1),
        )
        .col_expr(bird::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(bird::Column::Id.eq(link.record_id));
    if state.config.birds.enforce_ownership {
        update = update.filter(bird::Column::OwnerIdentity.eq(link.auth_user.identity()));
    }

    let result = update.exec(&state.db).await?;
    if result.rows_affected == 0 {
        tracing::debug!("Increment on unknown record ignored");
    }

    Ok(to_listing())
}
