use axum::middleware::from_fn_with_state;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{controllers::home_controller, AppState};

pub mod home_routes;
pub mod watchlist_routes;
pub mod alerts_routes;

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = home_routes::add_routes(router);
    let router = watchlist_routes::add_routes(router);
    let router = alerts_routes::add_routes(router);

    router
        .fallback(home_controller::not_found)
        // resolves the session cookie into a `Session` extension
        .layer(from_fn_with_state(state.clone(), crate::auth::inject_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
