use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::watchlist_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/watchlist",
            get(watchlist_controller::get_overview).post(watchlist_controller::post_add),
        )
        .route("/watchlist/items", get(watchlist_controller::get_items))
        .route("/watchlist/:symbol/member", get(watchlist_controller::get_membership))
        .route("/watchlist/:symbol/delete", post(watchlist_controller::post_remove))
}
