use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/birds", bird_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
}

fn bird_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::bird::list_birds))
        .routes(routes!(
            handlers::bird::add_form,
            handlers::bird::create_bird
        ))
        .routes(routes!(
            handlers::bird::edit_form,
            handlers::bird::update_bird
        ))
        .routes(routes!(handlers::bird::capitalize_bird))
        .routes(routes!(handlers::bird::increment_bird))
}
