use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    models::{AlertInput, Session},
    AppState,
};

use super::{action_response, rejected_body, session_of};

const INVALID_ALERT: &str = "Invalid alert data";

// GET /alerts
pub async fn get_alerts(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
) -> Response {
    let session = session_of(session);
    Json(state.alerts.list_for_owner(&session).await).into_response()
}

// POST /alerts
pub async fn post_create_alert(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    input: Result<Json<AlertInput>, JsonRejection>,
) -> Response {
    let session = session_of(session);
    let Json(input) = match input {
        Ok(body) => body,
        Err(rejection) => return rejected_body(&session, rejection, INVALID_ALERT),
    };
    action_response(state.alerts.create(&session, &input).await)
}

// POST /alerts/:id
pub async fn post_update_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Option<Extension<Session>>,
    input: Result<Json<AlertInput>, JsonRejection>,
) -> Response {
    let session = session_of(session);
    let Json(input) = match input {
        Ok(body) => body,
        Err(rejection) => return rejected_body(&session, rejection, INVALID_ALERT),
    };
    action_response(state.alerts.update(&id, &session, &input).await)
}

// POST /alerts/:id/delete
pub async fn post_delete_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Option<Extension<Session>>,
) -> Response {
    let session = session_of(session);
    action_response(state.alerts.delete(&id, &session).await)
}
