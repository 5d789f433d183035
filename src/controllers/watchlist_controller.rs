use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    models::Session,
    services::{presentation_service, watchlist_service::normalize_symbol},
    AppState,
};

use super::{action_response, rejected_body, session_of};

#[derive(Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub company: String,
}

// GET /watchlist
pub async fn get_overview(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
) -> Response {
    let session = session_of(session);

    let entries = state.watchlist.list_for_owner(&session).await;
    let alerts = state.alerts.list_for_owner(&session).await;

    let symbols = presentation_service::quote_symbols(&entries, &alerts);
    let quotes = if symbols.is_empty() {
        Default::default()
    } else {
        state.quotes.quotes(&symbols).await
    };

    let news = presentation_service::fetch_news(state.news.as_ref(), &entries).await;

    Json(presentation_service::assemble(&entries, &alerts, &quotes, news)).into_response()
}

// GET /watchlist/items
pub async fn get_items(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
) -> Response {
    let session = session_of(session);
    Json(state.watchlist.list_for_owner(&session).await).into_response()
}

// POST /watchlist
pub async fn post_add(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    form: Result<Json<AddForm>, JsonRejection>,
) -> Response {
    let session = session_of(session);
    let Json(form) = match form {
        Ok(body) => body,
        Err(rejection) => return rejected_body(&session, rejection, "Invalid symbol"),
    };
    action_response(state.watchlist.add(&session, &form.symbol, &form.company).await)
}

// GET /watchlist/:symbol/member
pub async fn get_membership(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    session: Option<Extension<Session>>,
) -> Response {
    let session = session_of(session);
    let in_watchlist = state.watchlist.is_member(&session, &symbol).await;

    Json(json!({
        "symbol": normalize_symbol(&symbol),
        "inWatchlist": in_watchlist,
    }))
    .into_response()
}

// POST /watchlist/:symbol/delete
pub async fn post_remove(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    session: Option<Extension<Session>>,
) -> Response {
    let session = session_of(session);
    action_response(state.watchlist.remove(&session, &symbol).await)
}
