mod v1;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

/// Mount point of the sightings application. Redirects and signed links are
/// built from it.
pub const BIRDS_BASE: &str = "/api/v1/birds";

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v1", v1::routes())
}
